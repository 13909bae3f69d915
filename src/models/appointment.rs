use super::{appointment_type::AppointmentType, status::AppointmentStatus};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;

/// Half-open time range `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Returns `None` unless `end > start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (end > start).then_some(Self { start, end })
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn minutes(&self) -> i64 {
        self.duration().num_minutes()
    }

    /// Same duration, starting at `start`.
    pub fn shifted_to(&self, start: DateTime<Utc>) -> Self {
        Self {
            start,
            end: start + self.duration(),
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} → {}",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%H:%M")
        )
    }
}

/// Identity an overlap check runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Party {
    Staff(String),
    Athlete(String),
}

impl Party {
    pub fn id(&self) -> &str {
        match self {
            Party::Staff(id) | Party::Athlete(id) => id,
        }
    }

    /// Column holding this party's id in `appointments`.
    pub fn column(&self) -> &'static str {
        match self {
            Party::Staff(_) => "staff_id",
            Party::Athlete(_) => "athlete_id",
        }
    }

    pub fn matches(&self, appt: &Appointment) -> bool {
        match self {
            Party::Staff(id) => appt.staff_id == *id,
            Party::Athlete(id) => appt.athlete_id == *id,
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Party::Staff(id) => write!(f, "staff {id}"),
            Party::Athlete(id) => write!(f, "athlete {id}"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Appointment {
    pub id: String,
    pub org_id: Option<String>,
    pub athlete_id: String,
    pub staff_id: String,
    pub kind: AppointmentType,
    pub status: AppointmentStatus,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub location: Option<String>,
    pub recurrence_rule: Option<String>,
    pub series_id: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn window(&self) -> TimeWindow {
        TimeWindow {
            start: self.starts_at,
            end: self.ends_at,
        }
    }

    pub fn is_recurring(&self) -> bool {
        self.series_id.is_some()
    }

    /// Short id used in tables and messages.
    pub fn short_id(&self) -> &str {
        short_id(&self.id)
    }
}

pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// A validated appointment ready to be inserted.
#[derive(Debug, Clone, Serialize)]
pub struct NewAppointment {
    pub id: String,
    pub org_id: Option<String>,
    pub athlete_id: String,
    pub staff_id: String,
    pub kind: AppointmentType,
    pub status: AppointmentStatus,
    pub window: TimeWindow,
    pub notes: Option<String>,
    pub location: Option<String>,
    pub recurrence_rule: Option<String>,
    pub series_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewAppointment {
    pub fn with_series(mut self, series_id: &str, rule: Option<&str>) -> Self {
        self.series_id = Some(series_id.to_string());
        self.recurrence_rule = rule.map(str::to_string);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn window_rejects_non_positive_duration() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        assert!(TimeWindow::new(t, t).is_none());
        assert!(TimeWindow::new(t, t - Duration::minutes(1)).is_none());
        assert_eq!(TimeWindow::new(t, t + Duration::hours(1)).unwrap().minutes(), 60);
    }

    #[test]
    fn short_id_handles_short_strings() {
        assert_eq!(short_id("abc"), "abc");
        assert_eq!(short_id("0123456789"), "01234567");
    }
}
