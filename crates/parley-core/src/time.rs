//! Lenient timestamp parsing.
//!
//! Backends serialize timestamps either as RFC 3339 strings or as naive
//! ISO-8601 strings without an offset (`2025-03-01T12:00:00.123456`). Naive
//! timestamps are taken to be UTC.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Parse a backend timestamp, accepting RFC 3339 or naive UTC forms.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// Serde helper for `Option<DateTime<Utc>>` fields fed by [`parse_timestamp`].
///
/// Unparseable values deserialize to `None` instead of failing the frame.
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_rfc3339() {
        let dt = parse_timestamp("2025-03-01T12:30:00+02:00").unwrap();
        assert_eq!(dt.hour(), 10);
    }

    #[test]
    fn parses_naive_as_utc() {
        let dt = parse_timestamp("2025-03-01T12:30:00.123456").unwrap();
        assert_eq!(dt.day(), 1);
        assert_eq!(dt.hour(), 12);
    }

    #[test]
    fn parses_space_separated() {
        assert!(parse_timestamp("2025-03-01 12:30:00").is_some());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn lenient_field_tolerates_bad_values() {
        #[derive(Deserialize)]
        struct Row {
            #[serde(default, deserialize_with = "deserialize_lenient")]
            at: Option<DateTime<Utc>>,
        }
        let row: Row = serde_json::from_str(r#"{"at": "not a date"}"#).unwrap();
        assert!(row.at.is_none());
        let row: Row = serde_json::from_str(r#"{"at": null}"#).unwrap();
        assert!(row.at.is_none());
        let row: Row = serde_json::from_str("{}").unwrap();
        assert!(row.at.is_none());
    }
}
