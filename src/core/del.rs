use crate::db::log::audit_quiet;
use crate::db::pool::DbPool;
use crate::db::queries::{delete_ids, load_by_id, load_series};
use crate::errors::AppResult;
use crate::models::appointment::Appointment;
use crate::models::session::Session;

/// Hard delete. Use `cancel` to keep history instead.
pub struct DeleteLogic;

impl DeleteLogic {
    /// Rows `apply` would remove, so the caller can ask for confirmation.
    pub fn targets(
        pool: &DbPool,
        session: &Session,
        id: &str,
        whole_series: bool,
    ) -> AppResult<Vec<Appointment>> {
        let anchor = load_by_id(&pool.conn, session, id)?;
        match (&anchor.series_id, whole_series) {
            (Some(sid), true) => load_series(&pool.conn, session, sid, true),
            _ => Ok(vec![anchor]),
        }
    }

    pub fn apply(
        pool: &mut DbPool,
        session: &Session,
        id: &str,
        whole_series: bool,
    ) -> AppResult<usize> {
        session.ensure_can_write()?;

        let targets = Self::targets(pool, session, id, whole_series)?;
        let ids: Vec<String> = targets.iter().map(|a| a.id.clone()).collect();
        let deleted = delete_ids(&mut pool.conn, &ids)?;

        let target = targets
            .first()
            .and_then(|a| if whole_series { a.series_id.clone() } else { None })
            .unwrap_or_else(|| id.to_string());
        audit_quiet(
            &pool.conn,
            "del",
            &target,
            &format!("Deleted {deleted} appointment(s)"),
        );

        Ok(deleted)
    }
}
