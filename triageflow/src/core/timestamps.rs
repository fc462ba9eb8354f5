//! Step timestamp handling.
//!
//! The backend stamps steps with `time.time()`-style fractional Unix seconds,
//! but integer milliseconds and ISO-8601 strings show up too. All of them are
//! normalised to a UTC `DateTime`.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Represents a step timestamp.
pub type Timestamp = DateTime<Utc>;

/// Errors that can occur during timestamp parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimestampError {
    /// The timestamp string is empty.
    #[error("Empty timestamp string")]
    EmptyString,

    /// The timestamp value is invalid.
    #[error("Invalid timestamp: {0}")]
    InvalidFormat(String),

    /// Nanosecond precision is not supported.
    #[error("Nanosecond precision timestamps are not supported")]
    NanosecondPrecision,
}

/// Detected precision of a Unix timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnixPrecision {
    /// Seconds (<=10 digits)
    Seconds,
    /// Milliseconds (<=13 digits)
    Milliseconds,
    /// Microseconds (<=16 digits)
    Microseconds,
}

/// Detects the precision of a Unix timestamp based on digit count.
pub fn detect_unix_precision(timestamp: f64) -> Result<UnixPrecision, TimestampError> {
    let int_part = timestamp.abs().trunc();
    let digit_count = if int_part < 1.0 {
        1
    } else {
        format!("{int_part:.0}").len()
    };

    match digit_count {
        0..=10 => Ok(UnixPrecision::Seconds),
        11..=13 => Ok(UnixPrecision::Milliseconds),
        14..=16 => Ok(UnixPrecision::Microseconds),
        _ => Err(TimestampError::NanosecondPrecision),
    }
}

/// Parses a Unix timestamp with automatic precision detection.
///
/// A value with a fractional part is always read as seconds.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_unix_timestamp(value: f64) -> Result<Timestamp, TimestampError> {
    if !value.is_finite() {
        return Err(TimestampError::InvalidFormat(value.to_string()));
    }

    if value.fract().abs() > f64::EPSILON {
        let secs = value.trunc() as i64;
        let nanos = (value.fract().abs() * 1_000_000_000.0) as u32;
        return Utc
            .timestamp_opt(secs, nanos)
            .single()
            .ok_or_else(|| TimestampError::InvalidFormat(value.to_string()));
    }

    let whole = value as i64;
    let result = match detect_unix_precision(value)? {
        UnixPrecision::Seconds => Utc.timestamp_opt(whole, 0),
        UnixPrecision::Milliseconds => Utc.timestamp_millis_opt(whole),
        UnixPrecision::Microseconds => {
            Utc.timestamp_opt(whole / 1_000_000, ((whole % 1_000_000) * 1000) as u32)
        }
    };
    result
        .single()
        .ok_or_else(|| TimestampError::InvalidFormat(value.to_string()))
}

/// Parses a timestamp given as text: a number or an ISO-8601 string.
pub fn parse_timestamp(input: &str) -> Result<Timestamp, TimestampError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(TimestampError::EmptyString);
    }

    if let Ok(num) = trimmed.parse::<f64>() {
        return parse_unix_timestamp(num);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    Err(TimestampError::InvalidFormat(trimmed.to_string()))
}

/// Formats the wall-clock part of a timestamp, e.g. `14:30:05`.
#[must_use]
pub fn format_clock(ts: &Timestamp) -> String {
    ts.format("%H:%M:%S").to_string()
}

/// Serde helper accepting a number, a string, or null.
///
/// Unparseable values decode as `None` rather than failing the whole step.
pub fn deserialize_flexible<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let parsed = match raw {
        Some(serde_json::Value::Number(n)) => n.as_f64().and_then(|v| parse_unix_timestamp(v).ok()),
        Some(serde_json::Value::String(s)) => parse_timestamp(&s).ok(),
        _ => None,
    };
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_detect_unix_precision() {
        assert_eq!(detect_unix_precision(1_696_512_000.0).unwrap(), UnixPrecision::Seconds);
        assert_eq!(
            detect_unix_precision(1_696_512_000_000.0).unwrap(),
            UnixPrecision::Milliseconds
        );
        assert_eq!(
            detect_unix_precision(1_696_512_000_000_000.0).unwrap(),
            UnixPrecision::Microseconds
        );
        assert_eq!(
            detect_unix_precision(1_696_512_000_000_000_000.0),
            Err(TimestampError::NanosecondPrecision)
        );
    }

    #[test]
    fn test_fractional_seconds() {
        let dt = parse_unix_timestamp(1_696_516_205.25).unwrap();
        assert_eq!(dt.hour(), 14);
        assert_eq!(dt.minute(), 30);
        assert_eq!(dt.second(), 5);
    }

    #[test]
    fn test_milliseconds() {
        let dt = parse_unix_timestamp(1_696_516_205_000.0).unwrap();
        assert_eq!(format_clock(&dt), "14:30:05");
    }

    #[test]
    fn test_parse_iso8601() {
        let dt = parse_timestamp("2023-10-05T14:30:00Z").unwrap();
        assert_eq!(dt.year(), 2023);
        assert_eq!(dt.month(), 10);
        assert_eq!(dt.day(), 5);
    }

    #[test]
    fn test_parse_empty_string() {
        assert_eq!(parse_timestamp("  "), Err(TimestampError::EmptyString));
    }

    #[test]
    fn test_flexible_deserialize() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(default, deserialize_with = "deserialize_flexible")]
            ts: Option<Timestamp>,
        }

        let number: Holder = serde_json::from_str(r#"{"ts": 1696516205.5}"#).unwrap();
        assert!(number.ts.is_some());

        let text: Holder = serde_json::from_str(r#"{"ts": "2023-10-05T14:30:05+00:00"}"#).unwrap();
        assert_eq!(text.ts.map(|ts| format_clock(&ts)).as_deref(), Some("14:30:05"));

        let garbage: Holder = serde_json::from_str(r#"{"ts": "yesterday-ish"}"#).unwrap();
        assert!(garbage.ts.is_none());

        let missing: Holder = serde_json::from_str("{}").unwrap();
        assert!(missing.ts.is_none());
    }
}
