//! Arrival-time normalization
//!
//! The bus-arrival feed reports the same information in several shapes
//! depending on stop and time of day: free text, min/max bounds, a range
//! string, an absolute timestamp or a bare minute count. [`resolve_eta`]
//! tries each representation in a fixed order and returns the first match.
//! Status words such as "Llegando" are passed through as the last resort.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::Value;
use std::fmt;

use super::extractor::{coerce_i64, first_present};

/// Pre-formatted text, used verbatim
const TEXT_KEYS: &[&str] = &["eta_text", "arrival_text", "prediction", "texto"];

/// Numeric lower/upper bounds, in priority order
const BOUND_PAIRS: &[(&str, &str)] = &[
    ("min_arrival_time", "max_arrival_time"),
    ("arrival_min", "arrival_max"),
    ("eta_min", "eta_max"),
    ("min", "max"),
    ("a", "b"),
];

/// Free-text ranges such as "6-8" or "6 a 8"
const RANGE_TEXT_KEYS: &[&str] = &["arrives_in", "time", "eta", "range"];

const RANGE_SEPARATORS: &[&str] = &["-", "–", "—", " a ", " y "];

/// Absolute arrival instants
const TIMESTAMP_KEYS: &[&str] = &["timestamp", "datetime", "arrival_time", "eta_timestamp"];

/// Bare minute counts
const MINUTE_KEYS: &[&str] = &["minutes", "minutos", "arrives_in", "time", "eta"];

/// Status words passed through when no other shape matched
const VERBATIM_KEYS: &[&str] = &["time", "arrives_in"];

/// Naive layouts read in the reference time zone
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Numeric instants below this are not treated as Unix seconds (2001-09-09)
const MIN_EPOCH_SECS: i64 = 1_000_000_000;

/// Numeric instants above this are read as milliseconds
const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

/// Source of the current time; injected so the timestamp branch is testable
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a given instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Normalized arrival estimate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eta {
    /// Upstream text, shown as-is
    Text(String),
    /// Between `low` and `high` minutes
    Range { low: i64, high: i64 },
    /// Whole minutes until arrival
    Minutes(i64),
}

impl fmt::Display for Eta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eta::Text(text) => f.write_str(text),
            Eta::Range { low, high } => write!(f, "Entre {:02} Y {:02} min.", low, high),
            Eta::Minutes(n) => write!(f, "{} min", n),
        }
    }
}

/// Resolve the ETA of one arrival record.
///
/// Order: text, numeric bounds, range text, timestamp, minute count, then
/// any other non-empty `time`/`arrives_in` text verbatim. When
/// nothing matches and the record nests a `buses` list (one entry per vehicle
/// of a service), the first vehicle is resolved instead.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use navaja::services::eta::resolve_eta;
/// use serde_json::json;
///
/// let now = Utc::now().with_timezone(&chrono_tz::America::Santiago);
/// let eta = resolve_eta(&json!({"arrives_in": "6-8"}), &now).unwrap();
/// assert_eq!(eta.to_string(), "Entre 06 Y 08 min.");
/// ```
pub fn resolve_eta(record: &Value, now: &DateTime<Tz>) -> Option<Eta> {
    resolve_direct(record, now).or_else(|| {
        record
            .get("buses")?
            .as_array()?
            .iter()
            .find(|bus| bus.is_object())
            .and_then(|bus| resolve_direct(bus, now))
    })
}

fn resolve_direct(record: &Value, now: &DateTime<Tz>) -> Option<Eta> {
    if !record.is_object() {
        return None;
    }
    from_text(record)
        .or_else(|| from_bounds(record))
        .or_else(|| from_range_text(record))
        .or_else(|| from_timestamp(record, now))
        .or_else(|| from_minutes(record))
        .or_else(|| from_verbatim(record))
}

fn from_text(record: &Value) -> Option<Eta> {
    TEXT_KEYS.iter().find_map(|key| match record.get(*key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(Eta::Text(s.clone())),
        _ => None,
    })
}

fn from_bounds(record: &Value) -> Option<Eta> {
    BOUND_PAIRS.iter().find_map(|(low_key, high_key)| {
        let low = coerce_i64(record.get(*low_key)?)?;
        let high = coerce_i64(record.get(*high_key)?)?;
        Some(Eta::Range { low, high })
    })
}

fn from_range_text(record: &Value) -> Option<Eta> {
    RANGE_TEXT_KEYS.iter().find_map(|key| match record.get(*key) {
        Some(Value::String(s)) => parse_range(s),
        _ => None,
    })
}

/// Parse "6-8", "6 – 8", "6 a 8" or "6 y 8" into a range
pub fn parse_range(text: &str) -> Option<Eta> {
    RANGE_SEPARATORS.iter().find_map(|sep| {
        let (low, high) = text.split_once(sep)?;
        let low = low.trim().parse::<i64>().ok()?;
        let high = high.trim().parse::<i64>().ok()?;
        Some(Eta::Range { low, high })
    })
}

fn from_timestamp(record: &Value, now: &DateTime<Tz>) -> Option<Eta> {
    let value = first_present(record, TIMESTAMP_KEYS)?;
    let instant = parse_instant(value, &now.timezone())?;
    Some(Eta::Minutes(minutes_until(&instant, now)))
}

/// Whole minutes from `now` to `instant`, floored, never negative
pub fn minutes_until(instant: &DateTime<Utc>, now: &DateTime<Tz>) -> i64 {
    let seconds = (*instant - now.with_timezone(&Utc)).num_seconds();
    seconds.div_euclid(60).max(0)
}

/// Parse an RFC 3339 string, a naive local time in `tz`, or a Unix epoch
pub fn parse_instant(value: &Value, tz: &Tz) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            NAIVE_FORMATS.iter().find_map(|format| {
                let naive = NaiveDateTime::parse_from_str(s, format).ok()?;
                tz.from_local_datetime(&naive)
                    .earliest()
                    .map(|dt| dt.with_timezone(&Utc))
            })
        }
        Value::Number(_) => {
            let raw = coerce_i64(value)?;
            if raw >= MILLIS_THRESHOLD {
                DateTime::from_timestamp_millis(raw)
            } else if raw >= MIN_EPOCH_SECS {
                DateTime::from_timestamp(raw, 0)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn from_minutes(record: &Value) -> Option<Eta> {
    MINUTE_KEYS
        .iter()
        .filter_map(|key| record.get(*key))
        .find_map(coerce_i64)
        .map(Eta::Minutes)
}

fn from_verbatim(record: &Value) -> Option<Eta> {
    VERBATIM_KEYS.iter().find_map(|key| match record.get(*key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(Eta::Text(s.trim().to_string())),
        _ => None,
    })
}
