//! Lenient timestamp decoding for upstream payloads.
//!
//! Producers send either epoch milliseconds (`1718000000000`) or RFC 3339
//! strings. Anything else decodes to `None` instead of failing the message.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

/// Deserializes an optional timestamp from epoch milliseconds or RFC 3339.
///
/// # Errors
///
/// Never fails on unrecognized values; only propagates structural
/// deserializer errors.
pub fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(from_value))
}

/// Interprets a JSON value as a timestamp.
#[must_use]
pub fn from_value(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(from_millis),
        serde_json::Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<i64>().ok().and_then(from_millis)),
        _ => None,
    }
}

/// Converts epoch milliseconds into a UTC timestamp.
#[must_use]
pub fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_epoch_millis() {
        let Some(ts) = from_value(&json!(1_700_000_000_000_i64)) else {
            panic!("millis must decode");
        };
        assert_eq!(ts.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn accepts_rfc3339() {
        let Some(ts) = from_value(&json!("2024-05-01T10:00:00Z")) else {
            panic!("rfc3339 must decode");
        };
        assert_eq!(ts.to_rfc3339(), "2024-05-01T10:00:00+00:00");
    }

    #[test]
    fn garbage_is_none() {
        assert!(from_value(&json!("yesterday")).is_none());
        assert!(from_value(&json!(true)).is_none());
    }
}
