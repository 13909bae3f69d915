use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};

use super::time::at_utc;

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

pub fn parse_date_arg(s: &str) -> AppResult<NaiveDate> {
    parse_date(s).ok_or_else(|| AppError::InvalidDate(s.to_string()))
}

fn invalid(p: &str) -> AppError {
    AppError::InvalidDate(format!("invalid period '{p}'"))
}

fn last_of_month(first: NaiveDate) -> Option<NaiveDate> {
    first.checked_add_months(Months::new(1))?.pred_opt()
}

/// Inclusive first and last day of a single period token.
fn single_period(p: &str) -> AppResult<(NaiveDate, NaiveDate)> {
    match p.len() {
        // YYYY
        4 => {
            let y: i32 = p.parse().map_err(|_| invalid(p))?;
            let first = NaiveDate::from_ymd_opt(y, 1, 1).ok_or_else(|| invalid(p))?;
            let last = NaiveDate::from_ymd_opt(y, 12, 31).ok_or_else(|| invalid(p))?;
            Ok((first, last))
        }
        // YYYY-MM
        7 => {
            let first = parse_date(&format!("{p}-01")).ok_or_else(|| invalid(p))?;
            let last = last_of_month(first).ok_or_else(|| invalid(p))?;
            Ok((first, last))
        }
        // YYYY-MM-DD
        10 => {
            let d = parse_date(p).ok_or_else(|| invalid(p))?;
            Ok((d, d))
        }
        _ => Err(invalid(p)),
    }
}

/// Parse a period expression into inclusive date bounds.
///
/// Accepted forms:
/// - `YYYY`, `YYYY-MM`, `YYYY-MM-DD`
/// - `start:end` where both sides share one of the forms above
pub fn parse_period(p: &str) -> AppResult<(NaiveDate, NaiveDate)> {
    let p = p.trim();

    if let Some((start_raw, end_raw)) = p.split_once(':') {
        let (start, end) = (start_raw.trim(), end_raw.trim());
        if start.len() != end.len() {
            return Err(AppError::InvalidDate(format!(
                "period '{p}': start and end must have the same format"
            )));
        }
        let (first, _) = single_period(start)?;
        let (_, last) = single_period(end)?;
        if last < first {
            return Err(AppError::InvalidDate(format!("period '{p}' ends before it starts")));
        }
        return Ok((first, last));
    }

    single_period(p)
}

/// Half-open UTC bounds `[first 00:00, day after last 00:00)`.
pub fn day_bounds_utc(first: NaiveDate, last: NaiveDate) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
    let after = last
        .checked_add_days(Days::new(1))
        .ok_or_else(|| AppError::InvalidDate(last.to_string()))?;
    Ok((
        at_utc(first, chrono::NaiveTime::MIN),
        at_utc(after, chrono::NaiveTime::MIN),
    ))
}

/// `None` for `all`, bounds otherwise.
pub fn period_filter(p: &str) -> AppResult<Option<(DateTime<Utc>, DateTime<Utc>)>> {
    if p.trim().eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    let (first, last) = parse_period(p)?;
    day_bounds_utc(first, last).map(Some)
}

/// Current calendar month as a period token.
pub fn current_month() -> String {
    let t = today();
    format!("{:04}-{:02}", t.year(), t.month())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn month_period_covers_leap_february() {
        assert_eq!(parse_period("2024-02").unwrap(), (d(2024, 2, 1), d(2024, 2, 29)));
        assert_eq!(parse_period("2023-02").unwrap().1, d(2023, 2, 28));
    }

    #[test]
    fn ranges_take_outer_bounds() {
        assert_eq!(
            parse_period("2024-01:2024-03").unwrap(),
            (d(2024, 1, 1), d(2024, 3, 31))
        );
        assert_eq!(parse_period("2023:2024").unwrap(), (d(2023, 1, 1), d(2024, 12, 31)));
    }

    #[test]
    fn malformed_periods_are_rejected() {
        assert!(parse_period("2024-13").is_err());
        assert!(parse_period("2024:2024-01").is_err());
        assert!(parse_period("2024-03:2024-01").is_err());
        assert!(parse_period("soon").is_err());
    }

    #[test]
    fn all_means_unbounded() {
        assert!(period_filter("ALL").unwrap().is_none());
        let (from, to) = period_filter("2024-01-31").unwrap().unwrap();
        assert_eq!((to - from).num_hours(), 24);
    }
}
