//! Exchange-rate feeds (dólar observado, UF)

use super::SourceAdapter;
use crate::services::extractor::{coerce_f64, first_present};
use crate::types::Fragment;
use chrono::DateTime;
use chrono_tz::Tz;
use serde_json::Value;

/// Reads one rate from an indicator document.
///
/// Two shapes are seen in the wild: a time series (`{"serie": [{"valor": ..}]}`,
/// newest first) and a keyed summary (`{"dolar": {"valor": ..}}`).
pub struct CurrencyAdapter {
    code: String,
    name: String,
    nested_key: String,
    url: String,
}

impl CurrencyAdapter {
    pub fn new(code: &str, nested_key: &str, url: &str) -> Self {
        Self {
            code: code.to_string(),
            name: code.to_lowercase(),
            nested_key: nested_key.to_string(),
            url: url.to_string(),
        }
    }

    /// Snapshot key for this rate (e.g., "USD")
    pub fn code(&self) -> &str {
        &self.code
    }

    fn extract_rate(&self, doc: &Value) -> Option<f64> {
        let from_series = doc
            .get("serie")
            .and_then(Value::as_array)
            .and_then(|serie| serie.first())
            .and_then(|head| first_present(head, &["valor"]))
            .and_then(coerce_f64);

        from_series.or_else(|| {
            let nested = doc.get(self.nested_key.as_str())?;
            first_present(nested, &["valor"]).and_then(coerce_f64)
        })
    }
}

impl SourceAdapter for CurrencyAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn adapt(&self, doc: &Value, _now: &DateTime<Tz>) -> Option<Fragment> {
        let value = self.extract_rate(doc)?;
        Some(Fragment::Rate {
            code: self.code.clone(),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn rate(adapter: &CurrencyAdapter, doc: Value) -> Option<f64> {
        let now = Utc::now().with_timezone(&chrono_tz::America::Santiago);
        match adapter.adapt(&doc, &now)? {
            Fragment::Rate { value, .. } => Some(value),
            other => panic!("unexpected fragment {:?}", other),
        }
    }

    fn usd() -> CurrencyAdapter {
        CurrencyAdapter::new("USD", "dolar", "http://localhost/dolar")
    }

    #[test]
    fn test_series_shape() {
        let doc = json!({"serie": [{"valor": 987.3}, {"valor": 981.0}]});
        assert_eq!(rate(&usd(), doc), Some(987.3));
    }

    #[test]
    fn test_nested_shape() {
        let doc = json!({"dolar": {"valor": 950}});
        assert_eq!(rate(&usd(), doc), Some(950.0));
    }

    #[test]
    fn test_neither_shape() {
        assert_eq!(rate(&usd(), json!({"version": "1.7.0"})), None);
        assert_eq!(rate(&usd(), json!([1, 2, 3])), None);
        assert_eq!(rate(&usd(), json!("dolar")), None);
    }

    #[test]
    fn test_empty_series_falls_back_to_nested() {
        let doc = json!({"serie": [], "dolar": {"valor": "951,25"}});
        assert_eq!(rate(&usd(), doc), Some(951.25));
    }

    #[test]
    fn test_non_numeric_value() {
        let doc = json!({"serie": [{"valor": "sin dato"}]});
        assert_eq!(rate(&usd(), doc), None);
    }

    #[test]
    fn test_nested_key_is_per_adapter() {
        let uf = CurrencyAdapter::new("UF", "uf", "http://localhost/uf");
        assert_eq!(rate(&uf, json!({"dolar": {"valor": 950}})), None);
        assert_eq!(rate(&uf, json!({"uf": {"valor": 38910.2}})), Some(38910.2));
        assert_eq!(uf.name(), "uf");
        assert_eq!(uf.code(), "UF");
    }
}
