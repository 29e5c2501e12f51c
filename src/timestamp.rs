//! Timestamp parsing
//!
//! Provider records carry time in several shapes: epoch milliseconds for
//! series samples, ISO-8601 strings (with `T` or a space separator, with or
//! without an offset) for record-level fields. Parsing never panics; callers
//! get a typed result and decide what an unparsable value means for them.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Outcome of parsing a record timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampParse {
    /// Parsed wall-clock time (offset, if any, is discarded)
    Parsed(NaiveDateTime),
    /// A value was present but could not be read as a timestamp
    Unparsable(String),
    /// No value at all
    Missing,
}

impl TimestampParse {
    /// Parse a local wall-clock timestamp string
    pub fn local(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return TimestampParse::Missing;
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return TimestampParse::Missing;
        }
        match parse_datetime(trimmed) {
            Some(ParsedDateTime::Naive(dt)) => TimestampParse::Parsed(dt),
            Some(ParsedDateTime::Offset(dt)) => TimestampParse::Parsed(dt.naive_local()),
            None => TimestampParse::Unparsable(trimmed.to_string()),
        }
    }

    /// The parsed value, if any
    pub fn value(&self) -> Option<NaiveDateTime> {
        match self {
            TimestampParse::Parsed(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn is_unparsable(&self) -> bool {
        matches!(self, TimestampParse::Unparsable(_))
    }
}

enum ParsedDateTime {
    Naive(NaiveDateTime),
    Offset(DateTime<FixedOffset>),
}

fn parse_datetime(s: &str) -> Option<ParsedDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(ParsedDateTime::Offset(dt));
    }
    // Space-separated variant with an offset
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(ParsedDateTime::Offset(dt));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ParsedDateTime::Naive(dt));
        }
    }
    None
}

/// Parse an instant into epoch milliseconds.
///
/// Accepts integer or float epoch milliseconds, numeric strings, and ISO-8601
/// strings. Strings without an offset are read as UTC. Epoch values outside
/// the range chrono can represent are unreadable.
pub fn instant_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(float_millis)).and_then(representable),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(ms) = trimmed.parse::<i64>() {
                return representable(ms);
            }
            match parse_datetime(trimmed)? {
                ParsedDateTime::Offset(dt) => Some(dt.timestamp_millis()),
                ParsedDateTime::Naive(dt) => Some(Utc.from_utc_datetime(&dt).timestamp_millis()),
            }
        }
        _ => None,
    }
}

fn float_millis(ms: f64) -> Option<i64> {
    let floored = ms.floor();
    (floored.is_finite() && floored >= i64::MIN as f64 && floored < i64::MAX as f64).then(|| floored as i64)
}

fn representable(ms: i64) -> Option<i64> {
    Utc.timestamp_millis_opt(ms).single().map(|_| ms)
}

/// Render a timestamp string at second precision.
///
/// Fractional seconds are dropped and the separator normalized to `T`; an
/// offset is kept when the input carried one. Unparsable input is returned
/// unchanged.
pub fn to_seconds_precision(raw: &str) -> String {
    match parse_datetime(raw.trim()) {
        Some(ParsedDateTime::Naive(dt)) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
        Some(ParsedDateTime::Offset(dt)) => dt.format("%Y-%m-%dT%H:%M:%S%:z").to_string(),
        None => raw.to_string(),
    }
}

/// Render a JSON timestamp value as a compact string.
///
/// Epoch milliseconds become a UTC ISO string; strings go through
/// [`to_seconds_precision`].
pub fn render(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(to_seconds_precision(s)),
        Value::Number(_) => instant_millis(value)
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
        other => Some(other.to_string()),
    }
}

/// Normalize a calendar date value to `YYYY-MM-DD`.
///
/// Datetime strings are truncated to their date part. Anything else that is
/// not empty is kept verbatim so the record still carries a grouping key.
pub fn calendar_date(value: &Value) -> Option<String> {
    let raw = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => return None,
        other => other.to_string(),
    };
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
        return Some(date.format("%Y-%m-%d").to_string());
    }
    match parse_datetime(&raw) {
        Some(ParsedDateTime::Naive(dt)) => Some(dt.date().format("%Y-%m-%d").to_string()),
        Some(ParsedDateTime::Offset(dt)) => Some(dt.date_naive().format("%Y-%m-%d").to_string()),
        None => Some(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_local_timestamp_variants() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(7, 30, 0)
            .unwrap();

        assert_eq!(
            TimestampParse::local(Some("2024-05-01T07:30:00")),
            TimestampParse::Parsed(expected)
        );
        assert_eq!(
            TimestampParse::local(Some("2024-05-01 07:30:00.123")).value().unwrap(),
            expected + chrono::Duration::milliseconds(123)
        );
        assert_eq!(
            TimestampParse::local(Some("2024-05-01T07:30:00+02:00")),
            TimestampParse::Parsed(expected)
        );
    }

    #[test]
    fn test_local_timestamp_failures_are_typed() {
        assert_eq!(TimestampParse::local(None), TimestampParse::Missing);
        assert_eq!(TimestampParse::local(Some("  ")), TimestampParse::Missing);
        assert_eq!(
            TimestampParse::local(Some("yesterday")),
            TimestampParse::Unparsable("yesterday".to_string())
        );
    }

    #[test]
    fn test_instant_millis() {
        assert_eq!(instant_millis(&json!(1714546800000_i64)), Some(1714546800000));
        assert_eq!(instant_millis(&json!(1714546800000.7)), Some(1714546800000));
        assert_eq!(instant_millis(&json!("1714546800000")), Some(1714546800000));
        assert_eq!(instant_millis(&json!("2024-05-01T07:00:00Z")), Some(1714546800000));
        assert_eq!(instant_millis(&json!("2024-05-01 07:00:00")), Some(1714546800000));
        assert_eq!(instant_millis(&json!("2024-05-01T09:00:00+02:00")), Some(1714546800000));
        assert_eq!(instant_millis(&json!("soon")), None);
        assert_eq!(instant_millis(&json!(null)), None);
    }

    #[test]
    fn test_instant_millis_rejects_out_of_range() {
        assert_eq!(instant_millis(&json!(i64::MAX)), None);
        assert_eq!(instant_millis(&json!(i64::MIN)), None);
        assert_eq!(instant_millis(&json!(1e300)), None);
        assert_eq!(instant_millis(&json!(-1e19)), None);
        assert_eq!(instant_millis(&json!("9223372036854775807")), None);
        assert_eq!(render(&json!(1e300)), None);
        assert_eq!(instant_millis(&json!(-3_600_000_i64)), Some(-3_600_000));
    }

    #[test]
    fn test_render_drops_fraction() {
        assert_eq!(
            to_seconds_precision("2024-05-01 07:30:12.456789"),
            "2024-05-01T07:30:12"
        );
        assert_eq!(
            to_seconds_precision("2024-05-01T07:30:12.4+02:00"),
            "2024-05-01T07:30:12+02:00"
        );
        assert_eq!(to_seconds_precision("not a time"), "not a time");
        assert_eq!(render(&json!(1714546800000_i64)).unwrap(), "2024-05-01T07:00:00");
        assert_eq!(render(&json!(null)), None);
    }

    #[test]
    fn test_calendar_date() {
        assert_eq!(calendar_date(&json!("2024-05-01")).unwrap(), "2024-05-01");
        assert_eq!(calendar_date(&json!("2024-05-01 00:00:00")).unwrap(), "2024-05-01");
        assert_eq!(calendar_date(&json!("")), None);
        assert_eq!(calendar_date(&json!(null)), None);
    }
}
