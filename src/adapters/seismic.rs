//! Latest earthquake report

use super::SourceAdapter;
use crate::services::extractor::{coerce_f64, first_present, first_text};
use crate::types::{Fragment, SeismicEvent, MAGNITUDE_SENTINEL};
use chrono::DateTime;
use chrono_tz::Tz;
use serde_json::Value;

const MAGNITUDE_KEYS: &[&str] = &["Magnitud", "magnitud", "magnitude", "mag"];
const REFERENCE_KEYS: &[&str] = &["RefGeografica", "Referencia", "ref"];
const TIMESTAMP_KEYS: &[&str] = &["Fecha", "fecha"];
const DEPTH_KEYS: &[&str] = &["Profundidad", "profundidad"];
const LATITUDE_KEYS: &[&str] = &["Latitud", "lat", "Latitude"];
const LONGITUDE_KEYS: &[&str] = &["Longitud", "lon", "Longitude"];

pub struct SeismicAdapter {
    url: String,
}

impl SeismicAdapter {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
        }
    }

    /// Read the first element of the report list; the feed lists newest first.
    pub fn parse(doc: &Value) -> Option<SeismicEvent> {
        let latest = doc.as_array()?.first()?;
        if !latest.is_object() {
            return None;
        }

        Some(SeismicEvent {
            magnitude_label: magnitude_label(latest),
            reference: first_text(latest, REFERENCE_KEYS),
            timestamp: first_text(latest, TIMESTAMP_KEYS),
            depth_km: first_present(latest, DEPTH_KEYS).cloned(),
            latitude: first_present(latest, LATITUDE_KEYS).and_then(coerce_f64),
            longitude: first_present(latest, LONGITUDE_KEYS).and_then(coerce_f64),
        })
    }
}

/// "M 4.2" for numeric magnitudes, the raw text otherwise
fn magnitude_label(event: &Value) -> String {
    let Some(raw) = first_present(event, MAGNITUDE_KEYS) else {
        return MAGNITUDE_SENTINEL.to_string();
    };
    match coerce_f64(raw) {
        Some(magnitude) => format!("M {:.1}", magnitude),
        None => first_text(event, MAGNITUDE_KEYS).unwrap_or_else(|| MAGNITUDE_SENTINEL.to_string()),
    }
}

impl SourceAdapter for SeismicAdapter {
    fn name(&self) -> &str {
        "seismic"
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn adapt(&self, doc: &Value, _now: &DateTime<Tz>) -> Option<Fragment> {
        Self::parse(doc).map(Fragment::Seismic)
    }
}
