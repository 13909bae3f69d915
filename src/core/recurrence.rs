//! Recurrence expansion: one seed window + a [`RecurrenceConfig`] → the
//! concrete, chronologically ordered list of occurrence windows.
//!
//! Expansion is pure. All dates are computed on the seed's UTC calendar
//! date and re-attached to the seed's UTC time of day, so every occurrence
//! keeps the seed's duration.

use crate::models::appointment::TimeWindow;
use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Upper bound on generated occurrences when no end condition is given.
pub const DEFAULT_SAFETY_CAP: u32 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceKind {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndCondition {
    /// Total number of occurrences, seed included.
    Count(u32),
    /// Last calendar date (inclusive) an occurrence may start on.
    Until(NaiveDate),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceConfig {
    pub kind: RecurrenceKind,
    #[serde(default = "default_interval")]
    pub interval: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub days_of_week: Vec<Weekday>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<EndCondition>,
}

fn default_interval() -> u32 {
    1
}

impl Default for RecurrenceConfig {
    fn default() -> Self {
        Self::none()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecurrenceError {
    #[error("interval must be at least 1")]
    ZeroInterval,

    #[error("occurrence count must be at least 1")]
    ZeroCount,

    #[error("occurrence count {count} exceeds the safety cap of {cap}")]
    CountAboveCap { count: u32, cap: u32 },

    #[error("repeating until {until} needs more than the safety cap of {cap} occurrences")]
    UntilAboveCap { until: NaiveDate, cap: u32 },

    #[error("end date {until} is before the first occurrence on {seed}")]
    UntilBeforeSeed { until: NaiveDate, seed: NaiveDate },

    #[error("days of week can only be used with weekly recurrences (got {0})")]
    DaysOfWeekNotWeekly(RecurrenceKind),

    #[error("the first occurrence falls on {0}, which is not one of the selected days")]
    SeedWeekdayNotSelected(Weekday),

    #[error("occurrence on {next} would start before the previous one ends; shorten the appointment or widen the interval")]
    OccurrencesOverlap { next: NaiveDate },

    #[error("recurrence runs past the supported calendar range")]
    CalendarOverflow,
}

impl RecurrenceConfig {
    pub fn none() -> Self {
        Self {
            kind: RecurrenceKind::None,
            interval: 1,
            days_of_week: Vec::new(),
            end: None,
        }
    }

    pub fn daily(interval: u32) -> Self {
        Self {
            kind: RecurrenceKind::Daily,
            interval,
            ..Self::none()
        }
    }

    pub fn weekly(interval: u32, days_of_week: Vec<Weekday>) -> Self {
        Self {
            kind: RecurrenceKind::Weekly,
            interval,
            days_of_week,
            end: None,
        }
    }

    pub fn monthly(interval: u32) -> Self {
        Self {
            kind: RecurrenceKind::Monthly,
            interval,
            ..Self::none()
        }
    }

    pub fn with_end(mut self, end: EndCondition) -> Self {
        self.end = Some(end);
        self
    }

    pub fn is_recurring(&self) -> bool {
        self.kind != RecurrenceKind::None
    }

    /// JSON stored in `appointments.recurrence_rule`; `None` for non-recurring.
    pub fn to_rule(&self) -> Result<Option<String>, serde_json::Error> {
        if !self.is_recurring() {
            return Ok(None);
        }
        serde_json::to_string(self).map(Some)
    }

    pub fn from_rule(rule: Option<&str>) -> Result<Self, serde_json::Error> {
        match rule {
            Some(r) if !r.trim().is_empty() => serde_json::from_str(r),
            _ => Ok(Self::none()),
        }
    }

    fn check(&self, seed: &TimeWindow, safety_cap: u32) -> Result<(), RecurrenceError> {
        if self.kind == RecurrenceKind::None {
            return Ok(());
        }
        if self.interval == 0 {
            return Err(RecurrenceError::ZeroInterval);
        }
        if self.kind != RecurrenceKind::Weekly && !self.days_of_week.is_empty() {
            return Err(RecurrenceError::DaysOfWeekNotWeekly(self.kind));
        }

        let seed_date = seed.start.date_naive();
        if self.kind == RecurrenceKind::Weekly
            && !self.days_of_week.is_empty()
            && !self.days_of_week.contains(&seed_date.weekday())
        {
            return Err(RecurrenceError::SeedWeekdayNotSelected(seed_date.weekday()));
        }

        match self.end {
            Some(EndCondition::Count(0)) => Err(RecurrenceError::ZeroCount),
            Some(EndCondition::Count(count)) if count > safety_cap => {
                Err(RecurrenceError::CountAboveCap {
                    count,
                    cap: safety_cap,
                })
            }
            Some(EndCondition::Until(until)) if until < seed_date => {
                Err(RecurrenceError::UntilBeforeSeed {
                    until,
                    seed: seed_date,
                })
            }
            _ => Ok(()),
        }
    }

    /// Selected weekdays, Monday first, without duplicates. Falls back to
    /// the seed's own weekday.
    fn weekdays_for(&self, seed_date: NaiveDate) -> Vec<Weekday> {
        if self.days_of_week.is_empty() {
            return vec![seed_date.weekday()];
        }
        let mut days = self.days_of_week.clone();
        days.sort_by_key(|d| d.num_days_from_monday());
        days.dedup();
        days
    }

    /// Candidate start dates for step `k` (the k-th day, week or month block).
    fn dates_for_step(
        &self,
        seed_date: NaiveDate,
        weekdays: &[Weekday],
        k: u64,
    ) -> Result<Vec<NaiveDate>, RecurrenceError> {
        let step = k * u64::from(self.interval);
        match self.kind {
            RecurrenceKind::None => Ok(if k == 0 { vec![seed_date] } else { Vec::new() }),
            RecurrenceKind::Daily => Ok(vec![add_days(seed_date, step)?]),
            RecurrenceKind::Monthly => {
                // Anchored on the seed, so a clamped month does not shift the
                // following ones (Jan 31 → Feb 29 → Mar 31).
                let months = u32::try_from(step).map_err(|_| RecurrenceError::CalendarOverflow)?;
                seed_date
                    .checked_add_months(Months::new(months))
                    .map(|d| vec![d])
                    .ok_or(RecurrenceError::CalendarOverflow)
            }
            RecurrenceKind::Weekly => {
                let monday = seed_date
                    .checked_sub_days(Days::new(u64::from(
                        seed_date.weekday().num_days_from_monday(),
                    )))
                    .ok_or(RecurrenceError::CalendarOverflow)?;
                let week_start = add_days(monday, step * 7)?;
                let mut dates = Vec::with_capacity(weekdays.len());
                for day in weekdays {
                    let date = add_days(week_start, u64::from(day.num_days_from_monday()))?;
                    if date >= seed_date {
                        dates.push(date);
                    }
                }
                Ok(dates)
            }
        }
    }

    /// True when an open-ended rule was cut off by the safety cap.
    pub fn stopped_at_cap(&self, occurrences: usize, safety_cap: u32) -> bool {
        self.is_recurring() && self.end.is_none() && occurrences >= safety_cap.max(1) as usize
    }

    /// Human readable summary, e.g. "every 2 weeks on Mon, Wed, 4 times".
    pub fn describe(&self) -> String {
        let unit = match self.kind {
            RecurrenceKind::None => return "does not repeat".to_string(),
            RecurrenceKind::Daily => "day",
            RecurrenceKind::Weekly => "week",
            RecurrenceKind::Monthly => "month",
        };
        let mut out = if self.interval == 1 {
            format!("every {unit}")
        } else {
            format!("every {} {unit}s", self.interval)
        };
        if !self.days_of_week.is_empty() {
            let days: Vec<String> = self.days_of_week.iter().map(|d| d.to_string()).collect();
            out.push_str(&format!(" on {}", days.join(", ")));
        }
        match self.end {
            Some(EndCondition::Count(n)) => out.push_str(&format!(", {n} times")),
            Some(EndCondition::Until(d)) => out.push_str(&format!(", until {d}")),
            None => {}
        }
        out
    }
}

impl fmt::Display for RecurrenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecurrenceKind::None => "none",
            RecurrenceKind::Daily => "daily",
            RecurrenceKind::Weekly => "weekly",
            RecurrenceKind::Monthly => "monthly",
        };
        f.write_str(s)
    }
}

fn add_days(date: NaiveDate, days: u64) -> Result<NaiveDate, RecurrenceError> {
    date.checked_add_days(Days::new(days))
        .ok_or(RecurrenceError::CalendarOverflow)
}

/// Expand `seed` according to `config`.
///
/// The result always starts with the seed. Expansion stops at the count
/// limit or after the `until` date. Without an end condition it stops at
/// `safety_cap` occurrences; a bound that needs more than the cap is an
/// error. A cap of 0 is treated as 1.
pub fn expand(
    seed: TimeWindow,
    config: &RecurrenceConfig,
    safety_cap: u32,
) -> Result<Vec<TimeWindow>, RecurrenceError> {
    let safety_cap = safety_cap.max(1);
    config.check(&seed, safety_cap)?;

    if !config.is_recurring() {
        return Ok(vec![seed]);
    }

    let limit = match config.end {
        Some(EndCondition::Count(n)) => n,
        _ => safety_cap,
    } as usize;
    let until = match config.end {
        Some(EndCondition::Until(d)) => Some(d),
        _ => None,
    };

    let seed_date = seed.start.date_naive();
    let time_of_day = seed.start.time();
    let weekdays = config.weekdays_for(seed_date);

    let mut out: Vec<TimeWindow> = Vec::with_capacity(limit.min(64));
    let mut k: u64 = 0;

    'steps: loop {
        for date in config.dates_for_step(seed_date, &weekdays, k)? {
            if until.is_some_and(|u| date > u) {
                break 'steps;
            }
            if out.len() >= limit {
                if let Some(u) = until {
                    return Err(RecurrenceError::UntilAboveCap {
                        until: u,
                        cap: safety_cap,
                    });
                }
                break 'steps;
            }

            let next = seed.shifted_to(date.and_time(time_of_day).and_utc());
            if let Some(prev) = out.last()
                && prev.end > next.start
            {
                return Err(RecurrenceError::OccurrencesOverlap { next: date });
            }
            out.push(next);
        }
        k += 1;
    }

    tracing::debug!(
        kind = %config.kind,
        interval = config.interval,
        occurrences = out.len(),
        "expanded recurrence"
    );

    if config.stopped_at_cap(out.len(), safety_cap) {
        tracing::warn!(cap = safety_cap, "recurrence truncated at safety cap");
    }

    Ok(out)
}

/// Parse a weekday from CLI input: `mon`, `Monday`, or ISO number `1`..`7`.
pub fn parse_weekday(token: &str) -> Option<Weekday> {
    let t = token.trim();
    if let Ok(n) = t.parse::<u8>() {
        return match n {
            1 => Some(Weekday::Mon),
            2 => Some(Weekday::Tue),
            3 => Some(Weekday::Wed),
            4 => Some(Weekday::Thu),
            5 => Some(Weekday::Fri),
            6 => Some(Weekday::Sat),
            7 => Some(Weekday::Sun),
            _ => None,
        };
    }
    t.parse::<Weekday>().ok()
}

/// Parse a comma separated weekday list such as `mon,wed,fri`.
pub fn parse_weekdays(list: &str) -> Result<Vec<Weekday>, String> {
    list.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_weekday(s).ok_or_else(|| s.trim().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn seed(start: DateTime<Utc>, minutes: i64) -> TimeWindow {
        TimeWindow::new(start, start + Duration::minutes(minutes)).unwrap()
    }

    fn assert_chronological(windows: &[TimeWindow]) {
        for pair in windows.windows(2) {
            assert!(pair[0].start < pair[1].start, "not strictly ordered: {pair:?}");
        }
    }

    #[test]
    fn none_yields_only_the_seed() {
        let s = seed(at(2024, 1, 1, 10, 0), 60);
        let out = expand(s, &RecurrenceConfig::none(), DEFAULT_SAFETY_CAP).unwrap();
        assert_eq!(out, vec![s]);

        // An end condition on a non-recurring config changes nothing.
        let cfg = RecurrenceConfig::none().with_end(EndCondition::Count(10));
        assert_eq!(expand(s, &cfg, DEFAULT_SAFETY_CAP).unwrap(), vec![s]);
    }

    #[test]
    fn daily_respects_interval_count_and_duration() {
        let s = seed(at(2024, 3, 30, 18, 30), 45);
        let cfg = RecurrenceConfig::daily(3).with_end(EndCondition::Count(5));
        let out = expand(s, &cfg, DEFAULT_SAFETY_CAP).unwrap();

        assert_eq!(out.len(), 5);
        assert_eq!(out[0], s);
        for pair in out.windows(2) {
            assert_eq!(pair[1].start - pair[0].start, Duration::days(3));
        }
        assert!(out.iter().all(|w| w.minutes() == 45));
        assert_eq!(out[4].start, at(2024, 4, 11, 18, 30));
    }

    #[test]
    fn weekly_monday_wednesday_example() {
        let s = seed(at(2024, 1, 1, 10, 0), 60);
        let cfg = RecurrenceConfig::weekly(1, vec![Weekday::Mon, Weekday::Wed])
            .with_end(EndCondition::Count(4));
        let out = expand(s, &cfg, DEFAULT_SAFETY_CAP).unwrap();

        let starts: Vec<_> = out.iter().map(|w| w.start).collect();
        assert_eq!(
            starts,
            vec![
                at(2024, 1, 1, 10, 0),
                at(2024, 1, 3, 10, 0),
                at(2024, 1, 8, 10, 0),
                at(2024, 1, 10, 10, 0),
            ]
        );
        assert!(out.iter().all(|w| w.end - w.start == Duration::hours(1)));
    }

    #[test]
    fn weekly_days_are_always_selected_days() {
        let days = vec![Weekday::Fri, Weekday::Tue, Weekday::Tue];
        // 2024-02-06 is a Tuesday.
        let s = seed(at(2024, 2, 6, 7, 15), 50);
        let cfg = RecurrenceConfig::weekly(2, days.clone()).with_end(EndCondition::Count(9));
        let out = expand(s, &cfg, DEFAULT_SAFETY_CAP).unwrap();

        assert_eq!(out.len(), 9);
        assert!(out.iter().all(|w| days.contains(&w.start.weekday())));
        assert_chronological(&out);
        // Week 0: Tue 6, Fri 9; week 2: Tue 20, Fri 23.
        assert_eq!(out[2].start, at(2024, 2, 20, 7, 15));
        assert_eq!(out[3].start, at(2024, 2, 23, 7, 15));
    }

    #[test]
    fn weekly_defaults_to_seed_weekday() {
        // 2024-05-02 is a Thursday.
        let s = seed(at(2024, 5, 2, 9, 0), 60);
        let cfg = RecurrenceConfig::weekly(1, Vec::new()).with_end(EndCondition::Count(3));
        let out = expand(s, &cfg, DEFAULT_SAFETY_CAP).unwrap();
        assert!(out.iter().all(|w| w.start.weekday() == Weekday::Thu));
        assert_eq!(out[2].start, at(2024, 5, 16, 9, 0));
    }

    #[test]
    fn weekly_rejects_seed_outside_selected_days() {
        let s = seed(at(2024, 1, 2, 10, 0), 60); // Tuesday
        let cfg = RecurrenceConfig::weekly(1, vec![Weekday::Mon]).with_end(EndCondition::Count(2));
        assert_eq!(
            expand(s, &cfg, DEFAULT_SAFETY_CAP),
            Err(RecurrenceError::SeedWeekdayNotSelected(Weekday::Tue))
        );
    }

    #[test]
    fn monthly_clamps_to_last_day_without_drift() {
        let s = seed(at(2024, 1, 31, 17, 0), 60);
        let cfg = RecurrenceConfig::monthly(1).with_end(EndCondition::Count(4));
        let out = expand(s, &cfg, DEFAULT_SAFETY_CAP).unwrap();
        let dates: Vec<_> = out.iter().map(|w| w.start.date_naive()).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
                NaiveDate::from_ymd_opt(2024, 4, 30).unwrap(),
            ]
        );
    }

    #[test]
    fn until_is_inclusive_of_the_end_date() {
        let s = seed(at(2024, 1, 1, 10, 0), 60);
        let until = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let cfg = RecurrenceConfig::daily(1).with_end(EndCondition::Until(until));
        let out = expand(s, &cfg, DEFAULT_SAFETY_CAP).unwrap();
        assert_eq!(out.len(), 5);
        assert_eq!(out.last().unwrap().start.date_naive(), until);
    }

    #[test]
    fn no_end_condition_stops_at_safety_cap() {
        let s = seed(at(2024, 1, 1, 10, 0), 30);
        let out = expand(s, &RecurrenceConfig::daily(1), 20).unwrap();
        assert_eq!(out.len(), 20);

        assert!(RecurrenceConfig::daily(1).stopped_at_cap(out.len(), 20));
    }

    #[test]
    fn until_needing_more_than_the_cap_is_refused() {
        let s = seed(at(2024, 1, 1, 10, 0), 30);
        let until = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        let cfg = RecurrenceConfig::daily(1).with_end(EndCondition::Until(until));
        assert_eq!(
            expand(s, &cfg, 20),
            Err(RecurrenceError::UntilAboveCap { until, cap: 20 })
        );

        // Exactly at the cap is fine.
        let until = NaiveDate::from_ymd_opt(2024, 1, 20).unwrap();
        let cfg = RecurrenceConfig::daily(1).with_end(EndCondition::Until(until));
        assert_eq!(expand(s, &cfg, 20).unwrap().len(), 20);
    }

    #[test]
    fn zero_cap_still_yields_the_seed() {
        let s = seed(at(2024, 1, 1, 10, 0), 30);
        let out = expand(s, &RecurrenceConfig::daily(1), 0).unwrap();
        assert_eq!(out, vec![s]);
    }

    #[test]
    fn misconfigurations_fail_fast() {
        let s = seed(at(2024, 1, 1, 10, 0), 60);

        assert_eq!(
            expand(s, &RecurrenceConfig::daily(0), DEFAULT_SAFETY_CAP),
            Err(RecurrenceError::ZeroInterval)
        );
        assert_eq!(
            expand(
                s,
                &RecurrenceConfig::daily(1).with_end(EndCondition::Count(0)),
                DEFAULT_SAFETY_CAP
            ),
            Err(RecurrenceError::ZeroCount)
        );
        assert_eq!(
            expand(
                s,
                &RecurrenceConfig::daily(1).with_end(EndCondition::Count(500)),
                DEFAULT_SAFETY_CAP
            ),
            Err(RecurrenceError::CountAboveCap {
                count: 500,
                cap: DEFAULT_SAFETY_CAP
            })
        );

        let before = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        assert!(matches!(
            expand(
                s,
                &RecurrenceConfig::daily(1).with_end(EndCondition::Until(before)),
                DEFAULT_SAFETY_CAP
            ),
            Err(RecurrenceError::UntilBeforeSeed { .. })
        ));

        let mut monthly_with_days = RecurrenceConfig::monthly(1);
        monthly_with_days.days_of_week = vec![Weekday::Mon];
        assert_eq!(
            expand(s, &monthly_with_days, DEFAULT_SAFETY_CAP),
            Err(RecurrenceError::DaysOfWeekNotWeekly(RecurrenceKind::Monthly))
        );
    }

    #[test]
    fn seed_longer_than_step_is_rejected() {
        let s = seed(at(2024, 1, 1, 10, 0), 26 * 60);
        let cfg = RecurrenceConfig::daily(1).with_end(EndCondition::Count(3));
        assert!(matches!(
            expand(s, &cfg, DEFAULT_SAFETY_CAP),
            Err(RecurrenceError::OccurrencesOverlap { .. })
        ));
    }

    #[test]
    fn expansion_is_deterministic() {
        let s = seed(at(2024, 6, 3, 6, 0), 90);
        let cfg = RecurrenceConfig::weekly(1, vec![Weekday::Mon, Weekday::Thu, Weekday::Sat])
            .with_end(EndCondition::Count(30));
        let a = expand(s, &cfg, DEFAULT_SAFETY_CAP).unwrap();
        let b = expand(s, &cfg, DEFAULT_SAFETY_CAP).unwrap();
        assert_eq!(a, b);
        assert_chronological(&a);
    }

    #[test]
    fn rule_survives_storage() {
        let cfg = RecurrenceConfig::weekly(2, vec![Weekday::Mon, Weekday::Fri])
            .with_end(EndCondition::Until(NaiveDate::from_ymd_opt(2024, 12, 20).unwrap()));
        let rule = cfg.to_rule().unwrap().unwrap();
        assert_eq!(RecurrenceConfig::from_rule(Some(&rule)).unwrap(), cfg);

        assert_eq!(RecurrenceConfig::none().to_rule().unwrap(), None);
        assert_eq!(RecurrenceConfig::from_rule(None).unwrap(), RecurrenceConfig::none());
        assert!(RecurrenceConfig::from_rule(Some("{not json")).is_err());
    }

    #[test]
    fn weekday_tokens() {
        assert_eq!(parse_weekday("mon"), Some(Weekday::Mon));
        assert_eq!(parse_weekday("Wednesday"), Some(Weekday::Wed));
        assert_eq!(parse_weekday("7"), Some(Weekday::Sun));
        assert_eq!(parse_weekday("8"), None);
        assert_eq!(
            parse_weekdays("mon, wed").unwrap(),
            vec![Weekday::Mon, Weekday::Wed]
        );
        assert_eq!(parse_weekdays("mon,xyz"), Err("xyz".to_string()));
    }

    #[test]
    fn describe_reads_naturally() {
        let cfg = RecurrenceConfig::weekly(2, vec![Weekday::Mon, Weekday::Wed])
            .with_end(EndCondition::Count(4));
        assert_eq!(cfg.describe(), "every 2 weeks on Mon, Wed, 4 times");
        assert_eq!(RecurrenceConfig::none().describe(), "does not repeat");
    }
}
