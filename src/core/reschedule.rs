use crate::config::Config;
use crate::core::overlap::{check_parties, enforce, should_check};
use crate::core::validator::{validate_window, window_warnings};
use crate::db::log::audit_quiet;
use crate::db::pool::DbPool;
use crate::db::queries::{load_by_id, update_window};
use crate::errors::{AppError, AppResult};
use crate::models::appointment::TimeWindow;
use crate::models::session::Session;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct MoveOutcome {
    pub id: String,
    pub from: TimeWindow,
    pub to: TimeWindow,
    pub warnings: Vec<String>,
}

/// Moves a single appointment to a new window.
pub struct RescheduleLogic;

impl RescheduleLogic {
    /// `new_end == None` keeps the current duration.
    pub fn apply(
        pool: &mut DbPool,
        cfg: &Config,
        session: &Session,
        id: &str,
        new_start: DateTime<Utc>,
        new_end: Option<DateTime<Utc>>,
        skip_overlap_check: bool,
        now: DateTime<Utc>,
    ) -> AppResult<MoveOutcome> {
        session.ensure_can_write()?;

        let current = load_by_id(&pool.conn, session, id)?;
        if current.status.is_cancelled() {
            return Err(AppError::Other(format!(
                "appointment {} is cancelled and cannot be moved",
                current.short_id()
            )));
        }

        let from = current.window();
        let end = new_end.unwrap_or(new_start + from.duration());
        let to = validate_window(Some(new_start), Some(end))?;

        let mut warnings = window_warnings(&to, now);

        if should_check(
            cfg.overlap_policy,
            &cfg.double_booking_types,
            current.kind,
            skip_overlap_check,
        ) {
            let conflicts = check_parties(
                &pool.conn,
                session,
                &to,
                &current.staff_id,
                &current.athlete_id,
                Some(&current.id),
            )?;
            warnings.extend(enforce(cfg.overlap_policy, "new time", &conflicts)?);
        }

        update_window(&pool.conn, &current.id, &to, now)?;
        audit_quiet(
            &pool.conn,
            "move",
            &current.id,
            &format!("Moved from {from} to {to}"),
        );

        Ok(MoveOutcome {
            id: current.id,
            from,
            to,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::recurrence::RecurrenceConfig;
    use crate::core::schedule::{BookingRequest, ScheduleLogic};
    use crate::core::validator::AppointmentDraft;
    use crate::db::initialize::init_db;
    use chrono::{Duration, TimeZone};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    fn book(pool: &mut DbPool, cfg: &Config, athlete: &str, day: u32, hour: u32) -> String {
        let req = BookingRequest {
            draft: AppointmentDraft {
                athlete_id: Some(athlete.into()),
                staff_id: Some("staff-1".into()),
                kind: Some("training".into()),
                starts_at: Some(at(day, hour)),
                ends_at: Some(at(day, hour) + Duration::minutes(90)),
                ..Default::default()
            },
            recurrence: RecurrenceConfig::none(),
            ..Default::default()
        };
        ScheduleLogic::book(pool, cfg, &Session::default(), req, at(1, 0))
            .unwrap()
            .appointments
            .remove(0)
            .id
    }

    fn setup() -> (DbPool, Config) {
        let pool = DbPool::in_memory().unwrap();
        init_db(&pool.conn).unwrap();
        (pool, Config::default())
    }

    #[test]
    fn keeps_duration_when_no_end_given() {
        let (mut pool, cfg) = setup();
        let id = book(&mut pool, &cfg, "ath-1", 2, 10);

        let out = RescheduleLogic::apply(&mut pool, &cfg, &Session::default(), &id, at(3, 14), None, false, at(1, 0))
            .unwrap();
        assert_eq!(out.to.start, at(3, 14));
        assert_eq!(out.to.minutes(), 90);

        let reloaded = load_by_id(&pool.conn, &Session::default(), &id).unwrap();
        assert_eq!(reloaded.window(), out.to);
    }

    #[test]
    fn moving_within_own_slot_is_not_a_conflict() {
        let (mut pool, cfg) = setup();
        let id = book(&mut pool, &cfg, "ath-1", 2, 10);
        let out = RescheduleLogic::apply(
            &mut pool,
            &cfg,
            &Session::default(),
            &id,
            at(2, 10) + Duration::minutes(30),
            None,
            false,
            at(1, 0),
        );
        assert!(out.is_ok());
    }

    #[test]
    fn blocked_by_another_booking() {
        let (mut pool, cfg) = setup();
        let id = book(&mut pool, &cfg, "ath-1", 2, 10);
        book(&mut pool, &cfg, "ath-2", 2, 14);

        let err = RescheduleLogic::apply(&mut pool, &cfg, &Session::default(), &id, at(2, 13), None, false, at(1, 0))
            .unwrap_err();
        assert!(matches!(err, AppError::Overlap { .. }));

        let unchanged = load_by_id(&pool.conn, &Session::default(), &id).unwrap();
        assert_eq!(unchanged.starts_at, at(2, 10));
    }

    #[test]
    fn end_before_start_is_a_validation_error() {
        let (mut pool, cfg) = setup();
        let id = book(&mut pool, &cfg, "ath-1", 2, 10);
        let err = RescheduleLogic::apply(
            &mut pool,
            &cfg,
            &Session::default(),
            &id,
            at(4, 12),
            Some(at(4, 11)),
            false,
            at(1, 0),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
