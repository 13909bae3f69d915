//! Time utilities: the canonical timestamp text format, HH:MM parsing and
//! duration rendering.

use crate::errors::{AppError, AppResult};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Stored timestamp layout. Fixed width so that text order is time order.
pub const TS_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

pub fn fmt_ts(t: DateTime<Utc>) -> String {
    t.format(TS_FORMAT).to_string()
}

/// Parse any RFC 3339 timestamp and normalise it to UTC.
pub fn parse_ts(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

pub fn parse_time(t: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(t.trim(), "%H:%M").ok()
}

pub fn parse_time_arg(t: &str) -> AppResult<NaiveTime> {
    parse_time(t).ok_or_else(|| AppError::InvalidTime(t.to_string()))
}

/// Wall-clock input is read as UTC.
pub fn at_utc(date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    date.and_time(time).and_utc()
}

pub fn format_minutes(mins: i64) -> String {
    let sign = if mins < 0 { "-" } else { "" };
    let m = mins.abs();
    if m < 60 {
        format!("{sign}{m}m")
    } else if m % 60 == 0 {
        format!("{sign}{}h", m / 60)
    } else {
        format!("{sign}{}h {:02}m", m / 60, m % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn stored_format_is_fixed_width_utc() {
        let t = Utc.with_ymd_and_hms(2024, 3, 5, 7, 4, 0).unwrap();
        assert_eq!(fmt_ts(t), "2024-03-05T07:04:00Z");
        assert_eq!(parse_ts("2024-03-05T09:04:00+02:00"), Some(t));
        assert_eq!(parse_ts("yesterday"), None);
    }

    #[test]
    fn minutes_render_compactly() {
        assert_eq!(format_minutes(45), "45m");
        assert_eq!(format_minutes(120), "2h");
        assert_eq!(format_minutes(95), "1h 35m");
    }

    #[test]
    fn rejects_malformed_clock_times() {
        assert!(parse_time("25:00").is_none());
        assert!(matches!(parse_time_arg("9"), Err(AppError::InvalidTime(_))));
        assert_eq!(parse_time("09:30"), NaiveTime::from_hms_opt(9, 30, 0));
    }
}
