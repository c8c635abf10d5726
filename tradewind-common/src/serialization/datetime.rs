//! ISO-8601 UTC timestamp formatting at microsecond precision.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::TradingError;

const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Format a timestamp as `YYYY-MM-DDTHH:MM:SS.ffffffZ`.
pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.format(FORMAT).to_string()
}

/// Parse a timestamp previously produced by [`format_timestamp`].
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, TradingError> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.fZ")
        .map(|naive| naive.and_utc())
        .map_err(|e| TradingError::Serialization(format!("cannot parse timestamp '{value}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_with_microseconds() {
        let value = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(format_timestamp(value), "1970-01-01T00:00:00.000000Z");
    }

    #[test]
    fn round_trips_at_microsecond_precision() {
        let value = Utc
            .with_ymd_and_hms(2020, 6, 15, 12, 30, 45)
            .unwrap()
            .checked_add_signed(chrono::Duration::microseconds(123_456))
            .unwrap();
        let formatted = format_timestamp(value);
        assert_eq!(formatted, "2020-06-15T12:30:45.123456Z");
        assert_eq!(parse_timestamp(&formatted).unwrap(), value);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("not-a-time").is_err());
    }
}
