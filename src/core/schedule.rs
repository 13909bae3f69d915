//! Booking pipeline for the `add` command.
//!
//! A request goes through: permission check, seed validation, recurrence
//! expansion, per-occurrence validation, overlap policy, and finally a
//! single atomic batch insert. Nothing is written unless every step passes.

use crate::config::Config;
use crate::core::overlap::{check_parties, enforce, should_check};
use crate::core::recurrence::{RecurrenceConfig, expand};
use crate::core::validator::{AppointmentDraft, ValidationErrors, Validated, validate};
use crate::db::log::audit_quiet;
use crate::db::pool::DbPool;
use crate::db::queries::insert_batch;
use crate::errors::{AppError, AppResult};
use crate::models::appointment::{NewAppointment, short_id};
use crate::models::session::Session;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct BookingRequest {
    pub draft: AppointmentDraft,
    pub recurrence: RecurrenceConfig,
    pub skip_overlap_check: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct BookingOutcome {
    /// Occurrences in chronological order, seed first.
    pub appointments: Vec<NewAppointment>,
    pub series_id: Option<String>,
    /// Validator remarks and overlaps tolerated by the policy.
    pub warnings: Vec<String>,
    pub saved: bool,
}

pub struct ScheduleLogic;

impl ScheduleLogic {
    pub fn book(
        pool: &mut DbPool,
        cfg: &Config,
        session: &Session,
        req: BookingRequest,
        now: DateTime<Utc>,
    ) -> AppResult<BookingOutcome> {
        session.ensure_can_write()?;

        let mut draft = req.draft;
        if draft.org_id.is_none() {
            draft.org_id = session.org_id.clone();
        }

        let limits = cfg.limits();
        let seed = validate(&draft, &limits, now)?;
        let windows = expand(seed.appointment.window, &req.recurrence, cfg.recurrence_safety_cap)?;
        let recurring = req.recurrence.is_recurring();

        let mut validated: Vec<Validated> = Vec::with_capacity(windows.len());
        let mut errors = ValidationErrors::new();
        validated.push(seed);

        for (i, window) in windows.iter().enumerate().skip(1) {
            let occurrence = AppointmentDraft {
                starts_at: Some(window.start),
                ends_at: Some(window.end),
                ..draft.clone()
            };
            match validate(&occurrence, &limits, now) {
                Ok(v) => validated.push(v),
                Err(e) => errors.absorb(&format!("#{}", i + 1), e),
            }
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let label = |i: usize| {
            if recurring {
                format!("occurrence #{}", i + 1)
            } else {
                "appointment".to_string()
            }
        };

        let mut warnings = Vec::new();
        if req.recurrence.stopped_at_cap(windows.len(), cfg.recurrence_safety_cap) {
            warnings.push(format!(
                "no end date or count given, series stopped at the safety cap of {} occurrences",
                windows.len()
            ));
        }
        for (i, v) in validated.iter().enumerate() {
            for w in &v.warnings {
                warnings.push(if recurring {
                    format!("{}: {w}", label(i))
                } else {
                    w.clone()
                });
            }
        }

        let kind = validated[0].appointment.kind;
        let occupies = !validated[0].appointment.status.is_cancelled();
        if occupies
            && should_check(
                cfg.overlap_policy,
                &cfg.double_booking_types,
                kind,
                req.skip_overlap_check,
            )
        {
            for (i, v) in validated.iter().enumerate() {
                let a = &v.appointment;
                let conflicts = check_parties(
                    &pool.conn,
                    session,
                    &a.window,
                    &a.staff_id,
                    &a.athlete_id,
                    None,
                )?;
                warnings.extend(enforce(cfg.overlap_policy, &label(i), &conflicts)?);
            }
        }

        let (series_id, rule) = if recurring {
            (
                Some(Uuid::new_v4().to_string()),
                req.recurrence.to_rule()?,
            )
        } else {
            (None, None)
        };

        let appointments: Vec<NewAppointment> = validated
            .into_iter()
            .map(|v| match &series_id {
                Some(sid) => v.appointment.with_series(sid, rule.as_deref()),
                None => v.appointment,
            })
            .collect();

        if req.dry_run {
            tracing::info!(occurrences = appointments.len(), "dry run, nothing saved");
            return Ok(BookingOutcome {
                appointments,
                series_id,
                warnings,
                saved: false,
            });
        }

        insert_batch(&mut pool.conn, &appointments)?;

        let first = &appointments[0];
        let (target, message) = match &series_id {
            Some(sid) => (
                sid.clone(),
                format!(
                    "Booked series of {} ({}) for athlete {} with staff {} starting {}",
                    appointments.len(),
                    req.recurrence.describe(),
                    first.athlete_id,
                    first.staff_id,
                    first.window
                ),
            ),
            None => (
                first.id.clone(),
                format!(
                    "Booked {} {} for athlete {} with staff {}",
                    first.kind,
                    first.window,
                    first.athlete_id,
                    first.staff_id
                ),
            ),
        };
        audit_quiet(&pool.conn, "add", &target, &message);
        tracing::info!(
            target = short_id(&target),
            occurrences = appointments.len(),
            "booking saved"
        );

        Ok(BookingOutcome {
            appointments,
            series_id,
            warnings,
            saved: true,
        })
    }
}
