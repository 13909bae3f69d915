//! Structural validation of appointment input.
//!
//! Failures are collected per field so that a caller can put each message
//! next to the input that caused it. Nothing here touches the database.

use crate::models::appointment::{NewAppointment, TimeWindow};
use crate::models::appointment_type::AppointmentType;
use crate::models::status::AppointmentStatus;
use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

pub const FIELD_ATHLETE: &str = "athlete_id";
pub const FIELD_STAFF: &str = "staff_id";
pub const FIELD_TYPE: &str = "type";
pub const FIELD_STATUS: &str = "status";
pub const FIELD_STARTS_AT: &str = "starts_at";
pub const FIELD_ENDS_AT: &str = "ends_at";
pub const FIELD_NOTES: &str = "notes";
pub const FIELD_LOCATION: &str = "location";

/// Recommended bounds; outside them a warning is emitted, not an error.
pub const MIN_RECOMMENDED_MINUTES: i64 = 15;
pub const MAX_RECOMMENDED_MINUTES: i64 = 180;

/// Raw, form-like appointment input.
#[derive(Debug, Clone, Default)]
pub struct AppointmentDraft {
    pub org_id: Option<String>,
    pub athlete_id: Option<String>,
    pub staff_id: Option<String>,
    pub kind: Option<String>,
    pub status: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub notes_max_len: usize,
    pub location_max_len: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            notes_max_len: 1000,
            location_max_len: 200,
        }
    }
}

/// Field name → message, in the order the fields were checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    entries: Vec<(String, String)>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error; only the first message per field is kept.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        let field = field.into();
        if self.get(&field).is_none() {
            self.entries.push((field, message.into()));
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, m)| m.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(f, _)| f.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(f, m)| (f.as_str(), m.as_str()))
    }

    /// Merge another set, prefixing its field names (e.g. `#3.ends_at`).
    pub fn absorb(&mut self, prefix: &str, other: ValidationErrors) {
        for (field, message) in other.entries {
            self.add(format!("{prefix}.{field}"), message);
        }
    }

    fn into_result<T>(self, ok: T) -> Result<T, ValidationErrors> {
        if self.is_empty() { Ok(ok) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, message)) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  {field}: {message}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Validated {
    pub appointment: NewAppointment,
    pub warnings: Vec<String>,
}

fn required_id(errors: &mut ValidationErrors, field: &str, value: Option<&str>, label: &str) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => {
            errors.add(field, format!("select a {label}"));
            String::new()
        }
    }
}

/// Trim, drop empty strings, enforce a maximum length in characters.
fn bounded_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&str>,
    max_len: usize,
) -> Option<String> {
    let v = value.map(str::trim).filter(|v| !v.is_empty())?;
    if v.chars().count() > max_len {
        errors.add(field, format!("must be at most {max_len} characters"));
    }
    Some(v.to_string())
}

/// `ends_at` strictly after `starts_at`; the error is attached to `ends_at`.
pub fn validate_window(
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
) -> Result<TimeWindow, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if starts_at.is_none() {
        errors.add(FIELD_STARTS_AT, "select a start time");
    }
    if ends_at.is_none() {
        errors.add(FIELD_ENDS_AT, "select an end time");
    }
    let (Some(start), Some(end)) = (starts_at, ends_at) else {
        return Err(errors);
    };
    match TimeWindow::new(start, end) {
        Some(w) => Ok(w),
        None => {
            errors.add(FIELD_ENDS_AT, "end time must be after the start time");
            Err(errors)
        }
    }
}

/// Check notes and location only; used by field edits.
pub fn validate_text_fields(
    notes: Option<&str>,
    location: Option<&str>,
    limits: &Limits,
) -> Result<(Option<String>, Option<String>), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let notes = bounded_text(&mut errors, FIELD_NOTES, notes, limits.notes_max_len);
    let location = bounded_text(&mut errors, FIELD_LOCATION, location, limits.location_max_len);
    errors.into_result((notes, location))
}

/// Non-blocking remarks about a window.
pub fn window_warnings(window: &TimeWindow, now: DateTime<Utc>) -> Vec<String> {
    let mut warnings = Vec::new();
    if window.start < now {
        warnings.push(format!("appointment on {} is in the past", window.start.format("%Y-%m-%d %H:%M")));
    }
    let minutes = window.minutes();
    if minutes < MIN_RECOMMENDED_MINUTES {
        warnings.push(format!(
            "duration of {minutes} min is below the recommended {MIN_RECOMMENDED_MINUTES} min"
        ));
    }
    if minutes > MAX_RECOMMENDED_MINUTES {
        warnings.push(format!(
            "duration of {minutes} min is above the recommended {MAX_RECOMMENDED_MINUTES} min"
        ));
    }
    warnings
}

/// Validate a draft and turn it into an insertable appointment.
pub fn validate(
    draft: &AppointmentDraft,
    limits: &Limits,
    now: DateTime<Utc>,
) -> Result<Validated, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let athlete_id = required_id(&mut errors, FIELD_ATHLETE, draft.athlete_id.as_deref(), "athlete");
    let staff_id = required_id(&mut errors, FIELD_STAFF, draft.staff_id.as_deref(), "staff member");

    let kind = match draft.kind.as_deref().map(str::trim) {
        Some(k) if !k.is_empty() => AppointmentType::from_input(k).or_else(|| {
            errors.add(FIELD_TYPE, format!("unknown appointment type '{k}'"));
            None
        }),
        _ => {
            errors.add(FIELD_TYPE, "select an appointment type");
            None
        }
    };

    let status = match draft.status.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => AppointmentStatus::from_input(s).or_else(|| {
            errors.add(FIELD_STATUS, format!("unknown status '{s}'"));
            None
        }),
        _ => Some(AppointmentStatus::Active),
    };

    let window = match validate_window(draft.starts_at, draft.ends_at) {
        Ok(w) => Some(w),
        Err(window_errors) => {
            for (field, message) in window_errors.iter() {
                errors.add(field, message);
            }
            None
        }
    };

    let notes = bounded_text(&mut errors, FIELD_NOTES, draft.notes.as_deref(), limits.notes_max_len);
    let location = bounded_text(
        &mut errors,
        FIELD_LOCATION,
        draft.location.as_deref(),
        limits.location_max_len,
    );

    let (Some(kind), Some(status), Some(window)) = (kind, status, window) else {
        return Err(errors);
    };
    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(Validated {
        warnings: window_warnings(&window, now),
        appointment: NewAppointment {
            id: Uuid::new_v4().to_string(),
            org_id: draft.org_id.clone(),
            athlete_id,
            staff_id,
            kind,
            status,
            window,
            notes,
            location,
            recurrence_rule: None,
            series_id: None,
            created_at: now,
        },
    })
}
