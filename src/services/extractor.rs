//! Field extraction over loosely-typed JSON
//!
//! Every upstream feed changes shape between releases, so each field is read
//! by trying an ordered list of candidate keys. All functions here are total:
//! a missing key, a wrong type or an unparseable number yields `None`.

use serde_json::Value;

/// Value of the first candidate key that is present and non-null.
///
/// Non-object nodes never match.
///
/// # Examples
/// ```
/// use navaja::services::extractor::first_present;
/// use serde_json::json;
///
/// let record = json!({"name": null, "stop": "Parada 3"});
/// assert_eq!(first_present(&record, &["name", "stop"]), Some(&json!("Parada 3")));
/// ```
pub fn first_present<'a>(node: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let map = node.as_object()?;
    keys.iter()
        .filter_map(|key| map.get(*key))
        .find(|value| !value.is_null())
}

/// First candidate key holding usable text.
///
/// Strings must be non-empty after trimming; numbers and booleans are
/// rendered. Objects and arrays are skipped so the next key is tried.
pub fn first_text(node: &Value, keys: &[&str]) -> Option<String> {
    let map = node.as_object()?;
    keys.iter()
        .filter_map(|key| map.get(*key))
        .find_map(value_text)
}

/// First candidate key holding an array
pub fn first_array<'a>(node: &'a Value, keys: &[&str]) -> Option<&'a Vec<Value>> {
    let map = node.as_object()?;
    keys.iter()
        .filter_map(|key| map.get(*key))
        .find_map(Value::as_array)
}

/// Render a scalar as display text.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Coerce an int, float or numeric string to `f64`.
///
/// Strings are trimmed and every comma is read as a decimal point, so
/// `"-33,45"` parses but `"1.234,56"` (two separator styles) does not.
///
/// # Examples
/// ```
/// use navaja::services::extractor::coerce_f64;
/// use serde_json::json;
///
/// assert_eq!(coerce_f64(&json!("-33,45")), Some(-33.45));
/// assert_eq!(coerce_f64(&json!("1.234,56")), None);
/// ```
pub fn coerce_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let normalized = s.trim().replace(',', ".");
            if normalized.is_empty() {
                return None;
            }
            normalized.parse::<f64>().ok()?
        }
        _ => return None,
    };
    number.is_finite().then_some(number)
}

/// Truncate a coerced value to an integer (toward zero).
pub fn coerce_i64(value: &Value) -> Option<i64> {
    let number = coerce_f64(value)?.trunc();
    if number < i64::MIN as f64 || number > i64::MAX as f64 {
        return None;
    }
    Some(number as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ========== first_present ==========

    #[test]
    fn test_first_present_skips_missing_and_null() {
        let node = json!({"b": null, "c": 3});
        assert_eq!(first_present(&node, &["a", "b", "c"]), Some(&json!(3)));
    }

    #[test]
    fn test_first_present_respects_order() {
        let node = json!({"name": "first", "title": "second"});
        assert_eq!(
            first_present(&node, &["title", "name"]),
            Some(&json!("second"))
        );
    }

    #[test]
    fn test_first_present_keeps_falsy_values() {
        // Only null is skipped: 0 and "" are present values
        let node = json!({"a": 0, "b": 5});
        assert_eq!(first_present(&node, &["a", "b"]), Some(&json!(0)));
    }

    #[test]
    fn test_first_present_non_object() {
        assert_eq!(first_present(&json!([1, 2]), &["a"]), None);
        assert_eq!(first_present(&json!("text"), &["a"]), None);
        assert_eq!(first_present(&Value::Null, &["a"]), None);
    }

    // ========== first_text ==========

    #[test]
    fn test_first_text_skips_empty_strings() {
        let node = json!({"name": "  ", "stop": "Parada 3"});
        assert_eq!(first_text(&node, &["name", "stop"]).as_deref(), Some("Parada 3"));
    }

    #[test]
    fn test_first_text_renders_numbers() {
        let node = json!({"id": 506});
        assert_eq!(first_text(&node, &["route", "id"]).as_deref(), Some("506"));
    }

    #[test]
    fn test_first_text_skips_containers() {
        let node = json!({"name": {"es": "x"}, "title": "T"});
        assert_eq!(first_text(&node, &["name", "title"]).as_deref(), Some("T"));
    }

    // ========== coerce_f64 ==========

    #[test]
    fn test_coerce_numbers() {
        assert_eq!(coerce_f64(&json!(987.3)), Some(987.3));
        assert_eq!(coerce_f64(&json!(950)), Some(950.0));
        assert_eq!(coerce_f64(&json!(-3)), Some(-3.0));
    }

    #[test]
    fn test_coerce_strings() {
        assert_eq!(coerce_f64(&json!("4.2")), Some(4.2));
        assert_eq!(coerce_f64(&json!(" 12 ")), Some(12.0));
        assert_eq!(coerce_f64(&json!("-70,65")), Some(-70.65));
    }

    #[test]
    fn test_coerce_rejects_mixed_separators() {
        assert_eq!(coerce_f64(&json!("1.234,56")), None);
        assert_eq!(coerce_f64(&json!("1,234.56")), None);
    }

    #[test]
    fn test_coerce_rejects_non_numeric() {
        assert_eq!(coerce_f64(&json!("abc")), None);
        assert_eq!(coerce_f64(&json!("")), None);
        assert_eq!(coerce_f64(&json!(true)), None);
        assert_eq!(coerce_f64(&json!(null)), None);
        assert_eq!(coerce_f64(&json!([1])), None);
        assert_eq!(coerce_f64(&json!("NaN")), None);
        assert_eq!(coerce_f64(&json!("inf")), None);
    }

    #[test]
    fn test_coerce_i64_truncates() {
        assert_eq!(coerce_i64(&json!(6.9)), Some(6));
        assert_eq!(coerce_i64(&json!("8,7")), Some(8));
        assert_eq!(coerce_i64(&json!(-2.5)), Some(-2));
        assert_eq!(coerce_i64(&json!("x")), None);
    }

    #[test]
    fn test_first_present_then_coerce_and_array() {
        let node = json!({"valor": "n/a", "value": "12,5", "serie": [1]});
        // The first present key decides; a bad value does not fall through
        assert_eq!(first_present(&node, &["valor", "value"]).and_then(coerce_f64), None);
        assert_eq!(first_present(&node, &["value"]).and_then(coerce_f64), Some(12.5));
        assert_eq!(first_array(&node, &["valor", "serie"]).map(Vec::len), Some(1));
        assert!(first_array(&node, &["missing"]).is_none());
    }
}
