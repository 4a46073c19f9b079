//! Metro network status feed

use super::SourceAdapter;
use crate::services::extractor::{first_array, first_text, value_text};
use crate::types::{Fragment, LineIncident, NetworkStatus};
use chrono::DateTime;
use chrono_tz::Tz;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

const LIST_KEYS: &[&str] = &["lineas", "lines", "data"];
const ID_KEYS: &[&str] = &["nombre", "name", "linea", "id"];
const STATUS_KEYS: &[&str] = &["estado", "status", "detalle", "state", "mensaje"];

const INCIDENT_KEYS: &[&str] = &["incidencias", "incidents", "issues"];
const INCIDENT_STATION_KEYS: &[&str] = &["estacion", "station", "name", "id"];
const INCIDENT_DETAIL_KEYS: &[&str] = &["detalle", "detail", "status", "description"];

const STATION_KEYS: &[&str] = &["estaciones", "stations"];
const STATION_NAME_KEYS: &[&str] = &["nombre", "name", "id"];
const STATION_STATE_KEYS: &[&str] = &["estado", "status"];

/// Station states that do not count as an incident
const FINE_STATES: &[&str] = &["normal", "operativa", "ok"];

fn linea_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^L[IÍ]NEA(\d)").expect("valid regex"))
}

fn line_like() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^L\d+[A-Z]?$").expect("valid regex"))
}

/// Normalize a line identifier: "Línea 4a" → "L4A", "l1" → "L1", "5" → "L5".
///
/// # Examples
/// ```
/// use navaja::adapters::normalize_line_id;
///
/// assert_eq!(normalize_line_id("Línea 4a"), "L4A");
/// assert_eq!(normalize_line_id(" l 1 "), "L1");
/// assert_eq!(normalize_line_id("6"), "L6");
/// ```
pub fn normalize_line_id(raw: &str) -> String {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    let id = linea_prefix().replace(&compact, "L$1").into_owned();
    if id.starts_with(|c: char| c.is_ascii_digit()) {
        format!("L{}", id)
    } else {
        id
    }
}

/// Reads per-line status and incident signals from the network-status document
pub struct NetworkAdapter {
    url: String,
}

impl NetworkAdapter {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
        }
    }

    /// Parse any of the three known layouts. `None` when no line was found.
    pub fn parse(doc: &Value) -> Option<NetworkStatus> {
        let mut status = NetworkStatus::default();
        let mut seen = 0usize;

        match doc {
            Value::Object(map) => match non_empty_list(doc) {
                Some(records) => {
                    for record in records {
                        seen += read_record(record, None, &mut status);
                    }
                }
                None => seen += read_keyed(map, &mut status),
            },
            Value::Array(records) => {
                for record in records {
                    seen += read_record(record, None, &mut status);
                }
            }
            _ => {}
        }

        (seen > 0).then_some(status)
    }
}

fn non_empty_list(doc: &Value) -> Option<&Vec<Value>> {
    let map = doc.as_object()?;
    LIST_KEYS
        .iter()
        .filter_map(|key| map.get(*key).and_then(Value::as_array))
        .find(|list| !list.is_empty())
}

/// `{"L1": "Operativa", "l4a": {"estado": ..}}`; non line-like keys are ignored
fn read_keyed(map: &Map<String, Value>, status: &mut NetworkStatus) -> usize {
    let mut seen = 0;
    for (key, value) in map {
        let id = normalize_line_id(key);
        if !line_like().is_match(&id) {
            continue;
        }
        match value {
            Value::Object(_) => seen += read_record(value, Some(id), status),
            scalar => {
                if let Some(text) = value_text(scalar) {
                    status.lines.insert(id, text);
                    seen += 1;
                }
            }
        }
    }
    seen
}

/// Read one line record; returns 1 when it named a line
fn read_record(record: &Value, id: Option<String>, status: &mut NetworkStatus) -> usize {
    let Some(id) = id.or_else(|| first_text(record, ID_KEYS).map(|raw| normalize_line_id(&raw)))
    else {
        return 0;
    };
    if id.is_empty() {
        return 0;
    }

    if let Some(text) = first_text(record, STATUS_KEYS) {
        status.lines.insert(id.clone(), text);
    }

    let incident = read_incident(record);
    if !incident.is_empty() {
        status.incidents.insert(id, incident);
    }
    1
}

fn read_incident(record: &Value) -> LineIncident {
    let mut incident = LineIncident::default();

    for key in INCIDENT_KEYS {
        let Some(items) = record.get(*key).and_then(Value::as_array) else {
            continue;
        };
        for item in items {
            if item.is_object() {
                if let Some(station) = first_text(item, INCIDENT_STATION_KEYS) {
                    incident.affected_stations.insert(station);
                }
                if let Some(detail) = first_text(item, INCIDENT_DETAIL_KEYS) {
                    incident.details.push(detail);
                }
            } else if let Some(detail) = value_text(item) {
                incident.details.push(detail);
            }
        }
    }

    for station in first_array(record, STATION_KEYS).into_iter().flatten() {
        let Some(name) = first_text(station, STATION_NAME_KEYS) else {
            continue;
        };
        let affected = first_text(station, STATION_STATE_KEYS)
            .map(|state| !FINE_STATES.contains(&state.to_lowercase().as_str()))
            .unwrap_or(false);
        if affected {
            incident.affected_stations.insert(name);
        }
    }

    incident
}

impl SourceAdapter for NetworkAdapter {
    fn name(&self) -> &str {
        "metro"
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn adapt(&self, doc: &Value, _now: &DateTime<Tz>) -> Option<Fragment> {
        Self::parse(doc).map(Fragment::Network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ========== normalize_line_id ==========

    #[test]
    fn test_normalize_line_id() {
        assert_eq!(normalize_line_id("L1"), "L1");
        assert_eq!(normalize_line_id("l4a"), "L4A");
        assert_eq!(normalize_line_id("Linea 5"), "L5");
        assert_eq!(normalize_line_id("LÍNEA 4A"), "L4A");
        assert_eq!(normalize_line_id("linea6"), "L6");
        assert_eq!(normalize_line_id("2"), "L2");
        assert_eq!(normalize_line_id("Lineal"), "LINEAL");
    }

    // ========== Layouts ==========

    #[test]
    fn test_keyed_object() {
        let doc = json!({
            "L1": "Operativa",
            "l2": "Con demoras",
            "L4A": {"estado": "Cerrada"},
            "lastUpdate": "2025-03-10 09:00",
            "version": 3
        });
        let status = NetworkAdapter::parse(&doc).unwrap();

        assert_eq!(status.lines["L1"], "Operativa");
        assert_eq!(status.lines["L2"], "Con demoras");
        assert_eq!(status.lines["L4A"], "Cerrada");
        assert_eq!(status.lines.len(), 3);
    }

    #[test]
    fn test_nested_list() {
        let doc = json!({
            "lineas": [
                {"nombre": "Línea 1", "estado": "Operativa"},
                {"name": "L5", "status": "Suspendida"},
                {"linea": "4a", "mensaje": "Con retrasos"},
                "garbage"
            ]
        });
        let status = NetworkAdapter::parse(&doc).unwrap();

        assert_eq!(status.lines["L1"], "Operativa");
        assert_eq!(status.lines["L5"], "Suspendida");
        assert_eq!(status.lines["L4A"], "Con retrasos");
    }

    #[test]
    fn test_bare_list() {
        let doc = json!([{"id": "L3", "state": "Operativa"}]);
        let status = NetworkAdapter::parse(&doc).unwrap();
        assert_eq!(status.lines["L3"], "Operativa");
    }

    #[test]
    fn test_record_without_status_keeps_default() {
        let doc = json!([{"id": "L3"}]);
        let status = NetworkAdapter::parse(&doc).unwrap();
        assert!(status.lines.is_empty());
    }

    #[test]
    fn test_no_lines_is_unusable() {
        assert!(NetworkAdapter::parse(&json!({})).is_none());
        assert!(NetworkAdapter::parse(&json!([])).is_none());
        assert!(NetworkAdapter::parse(&json!({"lineas": []})).is_none());
        assert!(NetworkAdapter::parse(&json!({"error": "mantención"})).is_none());
        assert!(NetworkAdapter::parse(&json!("Operativa")).is_none());
    }

    // ========== Incidents ==========

    #[test]
    fn test_incidents_and_stations() {
        let doc = json!({
            "lines": [{
                "name": "L1",
                "status": "Con demoras",
                "incidencias": [
                    {"estacion": "Los Héroes", "detalle": "Falla de tren"},
                    {"station": "Baquedano"},
                    "Servicio parcial"
                ],
                "estaciones": [
                    {"nombre": "Universidad de Chile", "estado": "Cerrada"},
                    {"nombre": "Los Héroes", "estado": "cerrada"},
                    {"nombre": "Moneda", "estado": "OPERATIVA"},
                    {"nombre": "Santa Lucía"}
                ]
            }, {
                "name": "L2",
                "status": "Operativa",
                "stations": [{"name": "Franklin", "status": "Normal"}]
            }]
        });
        let status = NetworkAdapter::parse(&doc).unwrap();
        let incident = &status.incidents["L1"];

        let stations: Vec<&str> = incident.affected_stations.iter().map(String::as_str).collect();
        assert_eq!(stations, ["Baquedano", "Los Héroes", "Universidad de Chile"]);
        assert_eq!(incident.details, ["Falla de tren", "Servicio parcial"]);
        assert!(!status.incidents.contains_key("L2"));
    }

    #[test]
    fn test_adapter_fragment() {
        let adapter = NetworkAdapter::new("http://localhost/metro");
        let now = chrono::Utc::now().with_timezone(&chrono_tz::America::Santiago);
        let fragment = adapter.adapt(&json!({"L1": "Operativa"}), &now).unwrap();
        assert!(matches!(fragment, Fragment::Network(_)));
        assert_eq!(adapter.name(), "metro");
    }
}
