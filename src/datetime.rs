//! Date/time utilities for minidrive.
//!
//! Timestamps are stored as fixed-width UTC text so that SQLite's string
//! comparison orders them chronologically.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

/// Storage format for timestamps (always 27 characters).
const DB_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Format a timestamp for storage.
pub fn to_db(dt: &DateTime<Utc>) -> String {
    dt.format(DB_FORMAT).to_string()
}

/// Parse a stored timestamp.
///
/// Accepts the storage format, RFC3339, and SQLite's `datetime('now')` form.
pub fn from_db(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, DB_FORMAT) {
        return Some(naive.and_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Current time in storage format.
pub fn now_db() -> String {
    to_db(&Utc::now())
}

/// Start of the "recent" window used by platform statistics.
pub fn days_ago(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now - Duration::days(days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_to_db_is_fixed_width() {
        let whole = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let fractional = whole + Duration::microseconds(5);
        assert_eq!(to_db(&whole), "2024-01-15T10:30:00.000000Z");
        assert_eq!(to_db(&fractional), "2024-01-15T10:30:00.000005Z");
        assert_eq!(to_db(&whole).len(), to_db(&fractional).len());
    }

    #[test]
    fn test_text_order_matches_time_order() {
        let a = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let b = a + Duration::microseconds(1);
        assert!(to_db(&a) < to_db(&b));
    }

    #[test]
    fn test_from_db_roundtrip() {
        let dt = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap() + Duration::microseconds(42);
        assert_eq!(from_db(&to_db(&dt)), Some(dt));
    }

    #[test]
    fn test_from_db_accepts_other_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(from_db("2024-01-15 10:30:00"), Some(expected));
        assert_eq!(from_db("2024-01-15T10:30:00+00:00"), Some(expected));
        assert_eq!(from_db("yesterday"), None);
    }

    #[test]
    fn test_days_ago() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let week = days_ago(now, 7);
        assert_eq!(week, Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap());
    }
}
