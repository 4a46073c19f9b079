//! Bus arrival predictions for a single stop

use super::SourceAdapter;
use crate::services::eta::resolve_eta;
use crate::services::extractor::{first_array, first_text};
use crate::types::{Arrival, Fragment, StopArrivals};
use chrono::DateTime;
use chrono_tz::Tz;
use serde_json::Value;

/// Arrivals kept per subscribed stop
pub const MAX_ARRIVALS: usize = 8;

/// Arrivals returned by an ad hoc lookup
pub const LOOKUP_ARRIVAL_LIMIT: usize = 10;

const NAME_KEYS: &[&str] = &["name", "stop", "title"];
const ARRIVAL_LIST_KEYS: &[&str] = &["buses", "services", "arrivals"];
const ROUTE_KEYS: &[&str] = &["route", "servicio", "service", "id"];
const DESTINATION_KEYS: &[&str] = &["headsign", "destination", "destino"];

pub struct StopAdapter {
    stop_id: String,
    name: String,
    url: String,
    limit: usize,
}

impl StopAdapter {
    pub fn new(stop_id: &str, url: &str) -> Self {
        Self {
            stop_id: stop_id.to_string(),
            name: format!("stop:{}", stop_id),
            url: url.to_string(),
            limit: MAX_ARRIVALS,
        }
    }

    /// Override how many arrivals are kept
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Build the arrivals board for this stop. `None` for a non-object document.
    pub fn parse(&self, doc: &Value, now: &DateTime<Tz>) -> Option<StopArrivals> {
        if !doc.is_object() {
            return None;
        }

        let display_name = first_text(doc, NAME_KEYS).unwrap_or_else(|| self.stop_id.clone());
        let arrivals = first_array(doc, ARRIVAL_LIST_KEYS)
            .into_iter()
            .flatten()
            .filter(|record| record.is_object())
            .take(self.limit)
            .map(|record| Arrival {
                route: first_text(record, ROUTE_KEYS).unwrap_or_default(),
                eta: resolve_eta(record, now).map(|eta| eta.to_string()),
                destination: first_text(record, DESTINATION_KEYS).unwrap_or_default(),
            })
            .collect();

        Some(StopArrivals {
            display_name,
            arrivals,
        })
    }
}

impl SourceAdapter for StopAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn adapt(&self, doc: &Value, now: &DateTime<Tz>) -> Option<Fragment> {
        let arrivals = self.parse(doc, now)?;
        Some(Fragment::Stop {
            stop_id: self.stop_id.clone(),
            arrivals,
        })
    }
}
