//! Lenient deserializers for backend payloads.
//!
//! The backend is loose about nulls and timestamp formats. A single bad row
//! must never fail the whole message list, so these helpers degrade to a
//! default instead of erroring.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use tracing::warn;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Text(String),
    Other(serde_json::Value),
}

/// Accepts RFC 3339 strings, SQL-style `YYYY-MM-DD HH:MM:SS` (UTC), or epoch
/// milliseconds. Anything else becomes `None`.
pub fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawTimestamp>::deserialize(deserializer)?;
    Ok(match raw {
        None => None,
        Some(RawTimestamp::Millis(ms)) => Utc.timestamp_millis_opt(ms).single(),
        Some(RawTimestamp::Text(text)) => parse_timestamp(&text),
        Some(RawTimestamp::Other(value)) => {
            warn!("Ignoring non-timestamp value {}", value);
            None
        }
    })
}

/// Parse a timestamp string the way the backend emits them.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQL rows carry no zone; they are stored as UTC.
            NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .map_err(|e| warn!("Corrupt timestamp '{}': {}", text, e))
        .ok()
}

/// Treat JSON `null` as the type's default.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
