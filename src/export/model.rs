// src/export/model.rs

use crate::core::recurrence::RecurrenceConfig;
use crate::models::appointment::Appointment;
use crate::utils::time::fmt_ts;
use serde::Serialize;

/// Flat row used by CSV and JSON exports.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct AppointmentExport {
    pub id: String,
    pub series_id: Option<String>,
    pub org_id: Option<String>,
    pub athlete_id: String,
    pub staff_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    pub starts_at: String,
    pub ends_at: String,
    pub duration_minutes: i64,
    pub location: Option<String>,
    pub notes: Option<String>,
    /// Human readable rule, e.g. `every 2 weeks on Mon, Thu`.
    pub recurrence: Option<String>,
    pub cancelled_at: Option<String>,
}

impl From<&Appointment> for AppointmentExport {
    fn from(a: &Appointment) -> Self {
        let recurrence = RecurrenceConfig::from_rule(a.recurrence_rule.as_deref())
            .ok()
            .filter(RecurrenceConfig::is_recurring)
            .map(|r| r.describe());

        Self {
            id: a.id.clone(),
            series_id: a.series_id.clone(),
            org_id: a.org_id.clone(),
            athlete_id: a.athlete_id.clone(),
            staff_id: a.staff_id.clone(),
            kind: a.kind.to_db_str().to_string(),
            status: a.status.to_db_str().to_string(),
            starts_at: fmt_ts(a.starts_at),
            ends_at: fmt_ts(a.ends_at),
            duration_minutes: a.window().minutes(),
            location: a.location.clone(),
            notes: a.notes.clone(),
            recurrence,
            cancelled_at: a.cancelled_at.map(fmt_ts),
        }
    }
}
