//! Scoped operations on recurring series: cancel and field edits applied to
//! one occurrence, to the occurrences from a given one onwards, or to all.

use crate::config::Config;
use crate::core::validator::{FIELD_TYPE, ValidationErrors, validate_text_fields};
use crate::db::log::audit_quiet;
use crate::db::pool::DbPool;
use crate::db::queries::{
    FieldChanges, load_by_id, load_series, update_fields_for_ids, update_status,
};
use crate::errors::{AppError, AppResult};
use crate::models::appointment::Appointment;
use crate::models::appointment_type::AppointmentType;
use crate::models::session::Session;
use crate::models::status::AppointmentStatus;
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use rusqlite::Connection;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Scope {
    /// Only the given appointment.
    #[default]
    Single,
    /// The given appointment and every later one in its series.
    Future,
    /// The whole series.
    All,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Scope::Single => "single",
            Scope::Future => "future",
            Scope::All => "all",
        };
        write!(f, "{s}")
    }
}

/// Rows a scoped operation applies to, oldest first.
///
/// A non-recurring appointment always resolves to itself.
pub fn resolve_targets(
    conn: &Connection,
    session: &Session,
    anchor: Appointment,
    scope: Scope,
    include_cancelled: bool,
) -> AppResult<Vec<Appointment>> {
    let series_id = match (&anchor.series_id, scope) {
        (Some(sid), Scope::Future | Scope::All) => sid.clone(),
        _ => return Ok(vec![anchor]),
    };

    let rows = load_series(conn, session, &series_id, include_cancelled)?;
    Ok(match scope {
        Scope::Future => rows
            .into_iter()
            .filter(|a| a.starts_at >= anchor.starts_at)
            .collect(),
        _ => rows,
    })
}

/// The appointment plus every non-cancelled row of its series, oldest first.
/// A standalone appointment is a series of one.
pub fn find_series(conn: &Connection, session: &Session, id: &str) -> AppResult<(Appointment, Vec<Appointment>)> {
    let anchor = load_by_id(conn, session, id)?;
    let series = match &anchor.series_id {
        Some(sid) => load_series(conn, session, sid, false)?,
        None => vec![anchor.clone()],
    };
    Ok((anchor, series))
}

#[derive(Debug, Clone, Default)]
pub struct EditRequest {
    pub kind: Option<String>,
    pub notes: Option<String>,
    pub location: Option<String>,
    pub clear_notes: bool,
    pub clear_location: bool,
}

impl EditRequest {
    fn into_changes(self, cfg: &Config) -> AppResult<FieldChanges> {
        let mut errors = ValidationErrors::new();

        let kind = match self.kind.as_deref() {
            Some(k) => AppointmentType::from_input(k).or_else(|| {
                errors.add(FIELD_TYPE, format!("unknown appointment type '{k}'"));
                None
            }),
            None => None,
        };

        let (notes, location) =
            match validate_text_fields(self.notes.as_deref(), self.location.as_deref(), &cfg.limits()) {
                Ok(v) => v,
                Err(e) => {
                    for (field, msg) in e.iter() {
                        errors.add(field, msg);
                    }
                    (None, None)
                }
            };

        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let changes = FieldChanges {
            kind,
            notes: if self.clear_notes { Some(None) } else { notes.map(Some) },
            location: if self.clear_location {
                Some(None)
            } else {
                location.map(Some)
            },
        };

        if changes.is_empty() {
            return Err(AppError::Other(
                "nothing to change: pass --type, --notes, --location or a --clear-* flag".into(),
            ));
        }
        Ok(changes)
    }
}

pub struct SeriesLogic;

impl SeriesLogic {
    /// Cancel the appointments selected by `scope`. Already cancelled rows
    /// are left untouched. Returns the cancelled appointments.
    pub fn cancel(
        pool: &mut DbPool,
        session: &Session,
        id: &str,
        scope: Scope,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Appointment>> {
        session.ensure_can_write()?;

        let anchor = load_by_id(&pool.conn, session, id)?;
        if anchor.status.is_cancelled() && scope == Scope::Single {
            return Err(AppError::Other(format!(
                "appointment {} is already cancelled",
                anchor.short_id()
            )));
        }
        let anchor_id = anchor.id.clone();

        let targets: Vec<Appointment> = resolve_targets(&pool.conn, session, anchor, scope, false)?;
        let ids: Vec<String> = targets.iter().map(|a| a.id.clone()).collect();
        update_status(&mut pool.conn, &ids, AppointmentStatus::Cancelled, now)?;

        audit_quiet(
            &pool.conn,
            "cancel",
            &anchor_id,
            &format!("Cancelled {} appointment(s), scope {scope}", ids.len()),
        );
        tracing::info!(count = ids.len(), %scope, "appointments cancelled");

        Ok(targets)
    }

    /// Apply field edits to the appointments selected by `scope`.
    /// Returns how many rows were updated.
    pub fn edit(
        pool: &mut DbPool,
        cfg: &Config,
        session: &Session,
        id: &str,
        scope: Scope,
        req: EditRequest,
        now: DateTime<Utc>,
    ) -> AppResult<usize> {
        session.ensure_can_write()?;

        let changes = req.into_changes(cfg)?;
        let anchor = load_by_id(&pool.conn, session, id)?;
        let anchor_id = anchor.id.clone();

        let targets = resolve_targets(&pool.conn, session, anchor, scope, true)?;
        let ids: Vec<String> = targets.into_iter().map(|a| a.id).collect();
        let updated = update_fields_for_ids(&mut pool.conn, &ids, &changes, now)?;

        audit_quiet(
            &pool.conn,
            "edit",
            &anchor_id,
            &format!("Edited {updated} appointment(s), scope {scope}"),
        );
        Ok(updated)
    }
}
