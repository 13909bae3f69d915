use crate::db::log::audit_quiet;
use crate::db::pool::DbPool;
use crate::db::queries::{load_by_id, update_status};
use crate::errors::AppResult;
use crate::models::appointment::Appointment;
use crate::models::session::Session;
use crate::models::status::AppointmentStatus;
use chrono::{DateTime, Utc};

/// Direct status writes. Any status may follow any other; moving to
/// `cancelled` stamps `cancelled_at`, moving away clears it.
pub struct StatusLogic;

impl StatusLogic {
    pub fn apply(
        pool: &mut DbPool,
        session: &Session,
        id: &str,
        status: AppointmentStatus,
        now: DateTime<Utc>,
    ) -> AppResult<Appointment> {
        session.ensure_can_write()?;

        let current = load_by_id(&pool.conn, session, id)?;
        let previous = current.status;

        update_status(&mut pool.conn, std::slice::from_ref(&current.id), status, now)?;
        audit_quiet(
            &pool.conn,
            "status",
            &current.id,
            &format!("Status changed from {previous} to {status}"),
        );

        load_by_id(&pool.conn, session, &current.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::initialize::init_db;
    use crate::db::queries::insert_appointment;
    use crate::errors::AppError;
    use crate::models::appointment::{NewAppointment, TimeWindow};
    use crate::models::appointment_type::AppointmentType;
    use crate::models::session::Role;
    use chrono::{Duration, TimeZone};

    fn setup() -> DbPool {
        let pool = DbPool::in_memory().unwrap();
        init_db(&pool.conn).unwrap();
        let start = Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap();
        insert_appointment(
            &pool.conn,
            &NewAppointment {
                id: "appt-1".into(),
                org_id: None,
                athlete_id: "ath-1".into(),
                staff_id: "staff-1".into(),
                kind: AppointmentType::Trial,
                status: AppointmentStatus::Active,
                window: TimeWindow::new(start, start + Duration::minutes(45)).unwrap(),
                notes: None,
                location: None,
                recurrence_rule: None,
                series_id: None,
                created_at: start - Duration::days(3),
            },
        )
        .unwrap();
        pool
    }

    #[test]
    fn any_transition_is_allowed() {
        let mut pool = setup();
        let session = Session::default();
        let now = Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap();

        let a = StatusLogic::apply(&mut pool, &session, "appt-1", AppointmentStatus::Completed, now).unwrap();
        assert_eq!(a.status, AppointmentStatus::Completed);

        let a = StatusLogic::apply(&mut pool, &session, "appt-1", AppointmentStatus::Cancelled, now).unwrap();
        assert_eq!(a.cancelled_at, Some(now));

        let a = StatusLogic::apply(&mut pool, &session, "appt-1", AppointmentStatus::InProgress, now).unwrap();
        assert_eq!(a.status, AppointmentStatus::InProgress);
        assert!(a.cancelled_at.is_none());
    }

    #[test]
    fn athletes_cannot_change_status() {
        let mut pool = setup();
        let session = Session::new(None, Some("ath-1".into()), Role::Athlete);
        let err = StatusLogic::apply(&mut pool, &session, "appt-1", AppointmentStatus::Completed, Utc::now())
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
