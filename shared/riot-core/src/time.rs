//! Fixed wire timestamp format: RFC3339 with nanoseconds, always UTC,
//! trailing fractional zeros trimmed.

use chrono::{DateTime, Timelike, Utc};

use crate::error::{ModelError, Result};

pub fn format_timestamp(time: &DateTime<Utc>) -> String {
    let base = time.format("%Y-%m-%dT%H:%M:%S");
    // Leap seconds carry nanos past one second
    let nanos = time.nanosecond() % 1_000_000_000;

    if nanos == 0 {
        format!("{base}Z")
    } else {
        let fraction = format!("{nanos:09}");
        format!("{base}.{}Z", fraction.trim_end_matches('0'))
    }
}

/// Parse any RFC3339 timestamp and normalize it to UTC
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ModelError::InvalidTimeFormat(format!("{value}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_trims_fraction() {
        let whole = Utc.with_ymd_and_hms(2018, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(format_timestamp(&whole), "2018-03-01T12:00:00Z");

        let half = whole + chrono::Duration::milliseconds(500);
        assert_eq!(format_timestamp(&half), "2018-03-01T12:00:00.5Z");

        let fine = whole + chrono::Duration::nanoseconds(123_456_789);
        assert_eq!(format_timestamp(&fine), "2018-03-01T12:00:00.123456789Z");
    }

    #[test]
    fn test_parse_normalizes_offset() {
        let parsed = parse_timestamp("2018-03-01T14:00:00.000000001+02:00").unwrap();
        assert_eq!(format_timestamp(&parsed), "2018-03-01T12:00:00.000000001Z");
    }

    #[test]
    fn test_format_then_parse_keeps_nanoseconds() {
        let t = Utc.timestamp_opt(1_520_000_000, 987_654_321).unwrap();
        assert_eq!(parse_timestamp(&format_timestamp(&t)).unwrap(), t);
    }

    #[test]
    fn test_parse_rejects_other_formats() {
        for bad in ["", "03/01/2018 12:00:00 UTC", "2018-03-01", "yesterday"] {
            assert!(matches!(
                parse_timestamp(bad),
                Err(ModelError::InvalidTimeFormat(_))
            ));
        }
    }
}
