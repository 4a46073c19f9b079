//! Snapshot types shared by adapters, the coordinator and readers

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Metro lines that must always be reported, even when the feed omits them
pub const KNOWN_LINES: [&str; 7] = ["L1", "L2", "L3", "L4", "L4A", "L5", "L6"];

/// Status shown for a line the feed has not reported
pub const DEFAULT_LINE_STATUS: &str = "Operational";

/// Placeholder shown when no magnitude is available
pub const MAGNITUDE_SENTINEL: &str = "N/A";

/// Unified output of one refresh cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub currency_rates: BTreeMap<String, Option<f64>>,
    pub network_lines: BTreeMap<String, String>,
    pub line_incidents: BTreeMap<String, LineIncident>,
    pub seismic_event: SeismicEvent,
    pub stop_arrivals: BTreeMap<String, StopArrivals>,
}

/// Incident signals reported for one Metro line
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineIncident {
    /// Deduplicated, sorted station names
    pub affected_stations: BTreeSet<String>,
    /// Free-text details in feed order
    pub details: Vec<String>,
}

impl LineIncident {
    pub fn is_empty(&self) -> bool {
        self.affected_stations.is_empty() && self.details.is_empty()
    }
}

/// Most recent earthquake report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeismicEvent {
    pub magnitude_label: String,
    pub reference: Option<String>,
    pub timestamp: Option<String>,
    /// Depth as reported upstream (number or text)
    pub depth_km: Option<Value>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Default for SeismicEvent {
    fn default() -> Self {
        Self {
            magnitude_label: MAGNITUDE_SENTINEL.to_string(),
            reference: None,
            timestamp: None,
            depth_km: None,
            latitude: None,
            longitude: None,
        }
    }
}

/// Upcoming arrivals for one bus stop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopArrivals {
    pub display_name: String,
    pub arrivals: Vec<Arrival>,
}

impl StopArrivals {
    /// Entry shown for a stop that has never been fetched successfully
    pub fn placeholder(stop_id: &str) -> Self {
        Self {
            display_name: stop_id.to_string(),
            arrivals: Vec::new(),
        }
    }
}

/// A single upcoming vehicle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arrival {
    pub route: String,
    pub eta: Option<String>,
    pub destination: String,
}

/// Line statuses and incidents parsed from one network-status document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkStatus {
    pub lines: BTreeMap<String, String>,
    pub incidents: BTreeMap<String, LineIncident>,
}

/// Partial snapshot produced by one adapter
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Rate { code: String, value: f64 },
    Network(NetworkStatus),
    Seismic(SeismicEvent),
    Stop {
        stop_id: String,
        arrivals: StopArrivals,
    },
}

/// Known lines seeded with the default status
pub fn default_lines() -> BTreeMap<String, String> {
    KNOWN_LINES
        .iter()
        .map(|line| (line.to_string(), DEFAULT_LINE_STATUS.to_string()))
        .collect()
}

impl Snapshot {
    /// Snapshot shown before any source has succeeded
    pub fn seeded<I, S>(currency_codes: I, stops: &[String]) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            currency_rates: currency_codes
                .into_iter()
                .map(|code| (code.into(), None))
                .collect(),
            network_lines: default_lines(),
            line_incidents: BTreeMap::new(),
            seismic_event: SeismicEvent::default(),
            stop_arrivals: stops
                .iter()
                .map(|id| (id.clone(), StopArrivals::placeholder(id)))
                .collect(),
        }
    }

    /// Copy of this snapshot restricted to `stops`, used as the base for the
    /// next merge. Stops seen before keep their last arrivals; new stops get a
    /// placeholder.
    pub fn carry_forward(&self, stops: &[String]) -> Self {
        let stop_arrivals = stops
            .iter()
            .map(|id| {
                let entry = self
                    .stop_arrivals
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| StopArrivals::placeholder(id));
                (id.clone(), entry)
            })
            .collect();

        let mut network_lines = default_lines();
        network_lines.extend(
            self.network_lines
                .iter()
                .map(|(id, status)| (id.clone(), status.clone())),
        );

        Self {
            currency_rates: self.currency_rates.clone(),
            network_lines,
            line_incidents: self.line_incidents.clone(),
            seismic_event: self.seismic_event.clone(),
            stop_arrivals,
        }
    }

    /// Overlay a fragment. Network data replaces lines and incidents on top
    /// of the defaults; a stop fragment for an unsubscribed stop is ignored.
    pub fn apply(&mut self, fragment: Fragment) {
        match fragment {
            Fragment::Rate { code, value } => {
                self.currency_rates.insert(code, Some(value));
            }
            Fragment::Network(status) => {
                let mut lines = default_lines();
                lines.extend(status.lines);
                self.network_lines = lines;
                self.line_incidents = status.incidents;
            }
            Fragment::Seismic(event) => {
                self.seismic_event = event;
            }
            Fragment::Stop { stop_id, arrivals } => {
                if let Some(slot) = self.stop_arrivals.get_mut(&stop_id) {
                    *slot = arrivals;
                }
            }
        }
    }

    /// One-line summary of the next bus at a stop: "route → destination (eta)"
    pub fn headline(&self, stop_id: &str) -> Option<String> {
        let first = self.stop_arrivals.get(stop_id)?.arrivals.first()?;
        match first.eta.as_deref() {
            Some(eta) if !eta.is_empty() && !first.route.is_empty() => Some(format!(
                "{} → {} ({})",
                first.route, first.destination, eta
            )),
            _ => None,
        }
    }
}
