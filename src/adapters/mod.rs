//! Source adapters: one per upstream feed
//!
//! An adapter knows a single feed's URL and how to turn its raw JSON into a
//! [`Fragment`]. Adapters are pure: no I/O, no shared state, no panics on
//! malformed input.

mod currency;
mod network;
mod seismic;
mod stop;

pub use currency::CurrencyAdapter;
pub use network::{normalize_line_id, NetworkAdapter};
pub use seismic::SeismicAdapter;
pub use stop::{StopAdapter, LOOKUP_ARRIVAL_LIMIT, MAX_ARRIVALS};

use crate::config::Endpoints;
use crate::types::Fragment;
use chrono::DateTime;
use chrono_tz::Tz;
use serde_json::Value;

/// Trait for turning one feed's document into a snapshot fragment
pub trait SourceAdapter: Send + Sync {
    /// Adapter name used in logs and cycle reports (e.g., "usd", "stop:PA433")
    fn name(&self) -> &str;

    /// URL fetched for this source
    fn url(&self) -> &str;

    /// Extract a fragment. `None` means the document held nothing usable and
    /// the previous value for this source should be kept.
    fn adapt(&self, doc: &Value, now: &DateTime<Tz>) -> Option<Fragment>;

    /// Same as [`adapt`](Self::adapt), accepting a failed fetch as `None`
    fn transform(&self, doc: Option<&Value>, now: &DateTime<Tz>) -> Option<Fragment> {
        doc.and_then(|doc| self.adapt(doc, now))
    }
}

/// Registry of the adapters polled each cycle
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn SourceAdapter>>,
    currency_codes: Vec<String>,
}

impl AdapterRegistry {
    /// Fixed feeds followed by one adapter per stop
    pub fn new(endpoints: &Endpoints, stops: &[String]) -> Self {
        let currencies = [
            CurrencyAdapter::new("USD", "dolar", &endpoints.usd),
            CurrencyAdapter::new("UF", "uf", &endpoints.uf),
        ];
        let currency_codes = currencies.iter().map(|c| c.code().to_string()).collect();

        let mut adapters: Vec<Box<dyn SourceAdapter>> = currencies
            .into_iter()
            .map(|c| Box::new(c) as Box<dyn SourceAdapter>)
            .collect();
        adapters.extend([
            Box::new(NetworkAdapter::new(&endpoints.metro)) as Box<dyn SourceAdapter>,
            Box::new(SeismicAdapter::new(&endpoints.seismic)) as Box<dyn SourceAdapter>,
        ]);
        adapters.extend(stops.iter().map(|stop_id| {
            Box::new(StopAdapter::new(stop_id, &endpoints.bus_stop_url(stop_id)))
                as Box<dyn SourceAdapter>
        }));
        Self {
            adapters,
            currency_codes,
        }
    }

    /// Get all registered adapters
    pub fn adapters(&self) -> &[Box<dyn SourceAdapter>] {
        &self.adapters
    }

    /// Currency codes reported by the registered currency adapters
    pub fn currency_codes(&self) -> &[String] {
        &self.currency_codes
    }

    /// Find an adapter by name
    pub fn get(&self, name: &str) -> Option<&dyn SourceAdapter> {
        self.adapters
            .iter()
            .find(|a| a.name() == name)
            .map(|a| a.as_ref())
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
