use crate::errors::{AppError, AppResult};
use crate::models::appointment::{Appointment, NewAppointment, Party, TimeWindow};
use crate::models::appointment_type::AppointmentType;
use crate::models::session::Session;
use crate::models::status::AppointmentStatus;
use crate::utils::time::{fmt_ts, parse_ts};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Result, Row, Transaction, params, params_from_iter};

const COLUMNS: &str = "id, org_id, athlete_id, staff_id, kind, status, starts_at, ends_at,
     notes, location, recurrence_rule, series_id, cancelled_at, created_at, updated_at";

fn conversion_error(col: usize, err: AppError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(col, rusqlite::types::Type::Text, Box::new(err))
}

fn ts_column(row: &Row, name: &str, col: usize) -> Result<DateTime<Utc>> {
    let raw: String = row.get(name)?;
    parse_ts(&raw).ok_or_else(|| conversion_error(col, AppError::InvalidDate(raw)))
}

fn opt_ts_column(row: &Row, name: &str, col: usize) -> Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(name)?;
    raw.map(|r| parse_ts(&r).ok_or_else(|| conversion_error(col, AppError::InvalidDate(r))))
        .transpose()
}

pub fn map_row(row: &Row) -> Result<Appointment> {
    let kind_str: String = row.get("kind")?;
    let kind = AppointmentType::from_db_str(&kind_str)
        .ok_or_else(|| conversion_error(4, AppError::InvalidType(kind_str.clone())))?;

    let status_str: String = row.get("status")?;
    let status = AppointmentStatus::from_db_str(&status_str)
        .ok_or_else(|| conversion_error(5, AppError::InvalidStatus(status_str.clone())))?;

    Ok(Appointment {
        id: row.get("id")?,
        org_id: row.get("org_id")?,
        athlete_id: row.get("athlete_id")?,
        staff_id: row.get("staff_id")?,
        kind,
        status,
        starts_at: ts_column(row, "starts_at", 6)?,
        ends_at: ts_column(row, "ends_at", 7)?,
        notes: row.get("notes")?,
        location: row.get("location")?,
        recurrence_rule: row.get("recurrence_rule")?,
        series_id: row.get("series_id")?,
        cancelled_at: opt_ts_column(row, "cancelled_at", 12)?,
        created_at: ts_column(row, "created_at", 13)?,
        updated_at: ts_column(row, "updated_at", 14)?,
    })
}

/// Accumulates `AND` clauses with anonymous `?` placeholders.
#[derive(Default)]
struct Where {
    clauses: Vec<String>,
    params: Vec<String>,
}

impl Where {
    fn push(&mut self, clause: &str, value: impl Into<String>) {
        self.clauses.push(clause.to_string());
        self.params.push(value.into());
    }

    fn raw(&mut self, clause: &str) {
        self.clauses.push(clause.to_string());
    }

    /// Tenant and athlete restrictions carried by the session.
    fn scoped(session: &Session) -> AppResult<Self> {
        let mut w = Self::default();
        if let Some(org) = &session.org_id {
            w.push("org_id = ?", org.clone());
        }
        if let Some(athlete) = session.athlete_scope()? {
            w.push("athlete_id = ?", athlete);
        }
        Ok(w)
    }

    fn sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }
}

fn query(conn: &Connection, filter: &Where, order: &str) -> AppResult<Vec<Appointment>> {
    let sql = format!("SELECT {COLUMNS} FROM appointments{} {order}", filter.sql());
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(filter.params.iter()), map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn insert_appointment(conn: &Connection, appt: &NewAppointment) -> Result<()> {
    let created = fmt_ts(appt.created_at);
    conn.execute(
        "INSERT INTO appointments (id, org_id, athlete_id, staff_id, kind, status, starts_at, ends_at,
                                   notes, location, recurrence_rule, series_id, cancelled_at,
                                   created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)",
        params![
            appt.id,
            appt.org_id,
            appt.athlete_id,
            appt.staff_id,
            appt.kind.to_db_str(),
            appt.status.to_db_str(),
            fmt_ts(appt.window.start),
            fmt_ts(appt.window.end),
            appt.notes,
            appt.location,
            appt.recurrence_rule,
            appt.series_id,
            appt.status.is_cancelled().then(|| created.clone()),
            created,
        ],
    )?;
    Ok(())
}

/// Insert every appointment in one transaction.
///
/// The first failing row aborts the batch: the transaction is rolled back
/// and the failure is reported once with its 1-based position.
pub fn insert_batch(conn: &mut Connection, items: &[NewAppointment]) -> AppResult<()> {
    let tx = conn.transaction()?;

    for (i, item) in items.iter().enumerate() {
        insert_appointment(&tx, item).map_err(|source| AppError::BatchInsert {
            index: i + 1,
            source,
        })?;
    }

    tx.commit()?;
    tracing::debug!(rows = items.len(), "batch committed");
    Ok(())
}

/// Load one appointment by full id or unambiguous id prefix.
pub fn load_by_id(conn: &Connection, session: &Session, id: &str) -> AppResult<Appointment> {
    let id = id.trim();
    if id.is_empty() {
        return Err(AppError::NotFound(String::new()));
    }

    let mut filter = Where::scoped(session)?;
    filter.push("id LIKE ? || '%'", id.replace(['%', '_'], ""));
    let mut found = query(conn, &filter, "ORDER BY starts_at ASC LIMIT 2")?;

    if let Some(pos) = found.iter().position(|a| a.id == id) {
        return Ok(found.swap_remove(pos));
    }
    match found.len() {
        0 => Err(AppError::NotFound(id.to_string())),
        1 => Ok(found.remove(0)),
        _ => Err(AppError::Other(format!(
            "id prefix '{id}' matches more than one appointment, use a longer prefix"
        ))),
    }
}

/// Non-cancelled appointments of `party` that intersect `window`.
pub fn load_for_party_between(
    conn: &Connection,
    session: &Session,
    party: &Party,
    window: &TimeWindow,
) -> AppResult<Vec<Appointment>> {
    let mut filter = Where::default();
    if let Some(org) = &session.org_id {
        filter.push("org_id = ?", org.clone());
    }
    filter.push(&format!("{} = ?", party.column()), party.id());
    filter.push("starts_at < ?", fmt_ts(window.end));
    filter.push("ends_at > ?", fmt_ts(window.start));
    filter.raw("status != 'cancelled'");

    query(conn, &filter, "ORDER BY starts_at ASC")
}

#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `starts_at`.
    pub to: Option<DateTime<Utc>>,
    pub staff_id: Option<String>,
    pub athlete_id: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub include_cancelled: bool,
}

pub fn list_filtered(
    conn: &Connection,
    session: &Session,
    f: &ListFilter,
) -> AppResult<Vec<Appointment>> {
    let mut filter = Where::scoped(session)?;

    // athletes only see what is still ahead of them
    if session.athlete_scope()?.is_some() {
        filter.push("starts_at >= ?", fmt_ts(Utc::now()));
        filter.raw("cancelled_at IS NULL");
    }

    if let Some(from) = f.from {
        filter.push("starts_at >= ?", fmt_ts(from));
    }
    if let Some(to) = f.to {
        filter.push("starts_at < ?", fmt_ts(to));
    }
    if let Some(staff) = &f.staff_id {
        filter.push("staff_id = ?", staff.clone());
    }
    if let Some(athlete) = &f.athlete_id {
        filter.push("athlete_id = ?", athlete.clone());
    }
    match f.status {
        Some(status) => filter.push("status = ?", status.to_db_str()),
        None if !f.include_cancelled => filter.raw("status != 'cancelled'"),
        None => {}
    }

    query(conn, &filter, "ORDER BY starts_at ASC, staff_id ASC")
}

/// Every row of a series, oldest first.
pub fn load_series(
    conn: &Connection,
    session: &Session,
    series_id: &str,
    include_cancelled: bool,
) -> AppResult<Vec<Appointment>> {
    let mut filter = Where::scoped(session)?;
    filter.push("series_id = ?", series_id);
    if !include_cancelled {
        filter.raw("status != 'cancelled'");
    }
    query(conn, &filter, "ORDER BY starts_at ASC")
}

pub fn update_window(
    conn: &Connection,
    id: &str,
    window: &TimeWindow,
    now: DateTime<Utc>,
) -> AppResult<()> {
    let changed = conn.execute(
        "UPDATE appointments SET starts_at = ?1, ends_at = ?2, updated_at = ?3 WHERE id = ?4",
        params![fmt_ts(window.start), fmt_ts(window.end), fmt_ts(now), id],
    )?;
    if changed == 0 {
        return Err(AppError::NotFound(id.to_string()));
    }
    Ok(())
}

fn set_status(tx: &Transaction, id: &str, status: AppointmentStatus, now: &str) -> Result<usize> {
    tx.execute(
        "UPDATE appointments
         SET status = ?1,
             cancelled_at = CASE WHEN ?1 = 'cancelled' THEN COALESCE(cancelled_at, ?2) ELSE NULL END,
             updated_at = ?2
         WHERE id = ?3",
        params![status.to_db_str(), now, id],
    )
}

/// Direct status write for a set of ids, all or nothing.
pub fn update_status(
    conn: &mut Connection,
    ids: &[String],
    status: AppointmentStatus,
    now: DateTime<Utc>,
) -> AppResult<usize> {
    let now = fmt_ts(now);
    let tx = conn.transaction()?;
    let mut changed = 0;
    for id in ids {
        changed += set_status(&tx, id, status, &now)?;
    }
    tx.commit()?;
    Ok(changed)
}

/// Field edits applied to one or more rows. `None` leaves a column as is;
/// `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default)]
pub struct FieldChanges {
    pub kind: Option<AppointmentType>,
    pub notes: Option<Option<String>>,
    pub location: Option<Option<String>>,
}

impl FieldChanges {
    pub fn is_empty(&self) -> bool {
        self.kind.is_none() && self.notes.is_none() && self.location.is_none()
    }
}

pub fn update_fields_for_ids(
    conn: &mut Connection,
    ids: &[String],
    changes: &FieldChanges,
    now: DateTime<Utc>,
) -> AppResult<usize> {
    let now = fmt_ts(now);
    let tx = conn.transaction()?;
    let mut changed = 0;

    for id in ids {
        if let Some(kind) = changes.kind {
            tx.execute(
                "UPDATE appointments SET kind = ?1 WHERE id = ?2",
                params![kind.to_db_str(), id],
            )?;
        }
        if let Some(notes) = &changes.notes {
            tx.execute(
                "UPDATE appointments SET notes = ?1 WHERE id = ?2",
                params![notes, id],
            )?;
        }
        if let Some(location) = &changes.location {
            tx.execute(
                "UPDATE appointments SET location = ?1 WHERE id = ?2",
                params![location, id],
            )?;
        }
        changed += tx.execute(
            "UPDATE appointments SET updated_at = ?1 WHERE id = ?2",
            params![now, id],
        )?;
    }

    tx.commit()?;
    Ok(changed)
}

pub fn delete_ids(conn: &mut Connection, ids: &[String]) -> AppResult<usize> {
    let tx = conn.transaction()?;
    let mut deleted = 0;
    for id in ids {
        deleted += tx.execute("DELETE FROM appointments WHERE id = ?1", [id])?;
    }
    tx.commit()?;
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool::DbPool;
    use crate::db::initialize::init_db;
    use crate::models::session::Role;
    use chrono::{Duration, TimeZone};

    fn pool() -> DbPool {
        let pool = DbPool::in_memory().unwrap();
        init_db(&pool.conn).unwrap();
        pool
    }

    fn new_appt(id: &str, staff: &str, day: u32, hour: u32) -> NewAppointment {
        let start = Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap();
        NewAppointment {
            id: id.into(),
            org_id: Some("club-a".into()),
            athlete_id: "ath-1".into(),
            staff_id: staff.into(),
            kind: AppointmentType::Training,
            status: AppointmentStatus::Active,
            window: TimeWindow::new(start, start + Duration::hours(1)).unwrap(),
            notes: None,
            location: Some("Room 1".into()),
            recurrence_rule: None,
            series_id: None,
            created_at: start - Duration::days(1),
        }
    }

    fn count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM appointments", [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn batch_is_all_or_nothing() {
        let mut pool = pool();
        insert_appointment(&pool.conn, &new_appt("taken", "staff-1", 1, 8)).unwrap();

        let batch = vec![
            new_appt("b1", "staff-1", 2, 10),
            new_appt("b2", "staff-1", 3, 10),
            new_appt("taken", "staff-1", 4, 10),
            new_appt("b4", "staff-1", 5, 10),
            new_appt("b5", "staff-1", 6, 10),
        ];

        let err = insert_batch(&mut pool.conn, &batch).unwrap_err();
        assert!(matches!(err, AppError::BatchInsert { index: 3, .. }));
        assert_eq!(count(&pool.conn), 1);

        let ok: Vec<_> = batch.into_iter().filter(|a| a.id != "taken").collect();
        insert_batch(&mut pool.conn, &ok).unwrap();
        assert_eq!(count(&pool.conn), 5);
    }

    #[test]
    fn row_round_trip_keeps_every_field() {
        let pool = pool();
        let mut appt = new_appt("full", "staff-1", 2, 10);
        appt.notes = Some("bring shoes".into());
        appt.series_id = Some("series-1".into());
        appt.recurrence_rule = Some(r#"{"kind":"daily","interval":1}"#.into());
        insert_appointment(&pool.conn, &appt).unwrap();

        let loaded = load_by_id(&pool.conn, &Session::default(), "full").unwrap();
        assert_eq!(loaded.window(), appt.window);
        assert_eq!(loaded.notes.as_deref(), Some("bring shoes"));
        assert_eq!(loaded.series_id.as_deref(), Some("series-1"));
        assert_eq!(loaded.created_at, appt.created_at);
        assert_eq!(loaded.updated_at, appt.created_at);
        assert!(loaded.cancelled_at.is_none());
    }

    #[test]
    fn id_prefix_lookup() {
        let pool = pool();
        insert_appointment(&pool.conn, &new_appt("abc-111", "s", 2, 10)).unwrap();
        insert_appointment(&pool.conn, &new_appt("abc-222", "s", 3, 10)).unwrap();
        let session = Session::default();

        assert_eq!(load_by_id(&pool.conn, &session, "abc-2").unwrap().id, "abc-222");
        assert!(matches!(load_by_id(&pool.conn, &session, "abc"), Err(AppError::Other(_))));
        assert!(matches!(load_by_id(&pool.conn, &session, "zzz"), Err(AppError::NotFound(_))));
    }

    #[test]
    fn party_window_query_uses_half_open_bounds() {
        let pool = pool();
        insert_appointment(&pool.conn, &new_appt("a", "staff-1", 2, 11)).unwrap();
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();

        let before = TimeWindow::new(start, start + Duration::hours(1)).unwrap();
        let party = Party::Staff("staff-1".into());
        assert!(load_for_party_between(&pool.conn, &Session::default(), &party, &before)
            .unwrap()
            .is_empty());

        let touching = before.shifted_to(start + Duration::minutes(30));
        assert_eq!(
            load_for_party_between(&pool.conn, &Session::default(), &party, &touching)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn session_scopes_reads() {
        let pool = pool();
        insert_appointment(&pool.conn, &new_appt("a", "staff-1", 2, 10)).unwrap();
        let mut other = new_appt("b", "staff-1", 2, 12);
        other.org_id = Some("club-b".into());
        other.athlete_id = "ath-2".into();
        insert_appointment(&pool.conn, &other).unwrap();

        let club_a = Session::new(Some("club-a".into()), None, Role::Trainer);
        let rows = list_filtered(&pool.conn, &club_a, &ListFilter::default()).unwrap();
        assert_eq!(rows.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(), vec!["a"]);

        let athlete = Session::new(None, Some("ath-2".into()), Role::Athlete);
        assert!(load_by_id(&pool.conn, &athlete, "a").is_err());
        assert_eq!(load_by_id(&pool.conn, &athlete, "b").unwrap().id, "b");
        // 2024 rows are in the past for an athlete listing
        assert!(list_filtered(&pool.conn, &athlete, &ListFilter::default())
            .unwrap()
            .is_empty());

        let mut upcoming = new_appt("c", "staff-1", 2, 12);
        upcoming.athlete_id = "ath-2".into();
        upcoming.window = upcoming.window.shifted_to(Utc::now() + Duration::days(2));
        insert_appointment(&pool.conn, &upcoming).unwrap();
        let rows = list_filtered(&pool.conn, &athlete, &ListFilter::default()).unwrap();
        assert_eq!(rows.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(), vec!["c"]);
    }

    #[test]
    fn status_writes_stamp_and_clear_cancellation() {
        let mut pool = pool();
        insert_appointment(&pool.conn, &new_appt("a", "staff-1", 2, 10)).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let ids = vec!["a".to_string()];

        update_status(&mut pool.conn, &ids, AppointmentStatus::Cancelled, now).unwrap();
        let a = load_by_id(&pool.conn, &Session::default(), "a").unwrap();
        assert_eq!(a.status, AppointmentStatus::Cancelled);
        assert_eq!(a.cancelled_at, Some(now));

        let hidden = list_filtered(&pool.conn, &Session::default(), &ListFilter::default()).unwrap();
        assert!(hidden.is_empty());

        update_status(&mut pool.conn, &ids, AppointmentStatus::Active, now).unwrap();
        let a = load_by_id(&pool.conn, &Session::default(), "a").unwrap();
        assert!(a.cancelled_at.is_none());
    }

    #[test]
    fn field_changes_can_clear_columns() {
        let mut pool = pool();
        insert_appointment(&pool.conn, &new_appt("a", "staff-1", 2, 10)).unwrap();
        let changes = FieldChanges {
            kind: Some(AppointmentType::Massage),
            notes: Some(Some("knee".into())),
            location: Some(None),
        };
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        update_fields_for_ids(&mut pool.conn, &["a".to_string()], &changes, now).unwrap();

        let a = load_by_id(&pool.conn, &Session::default(), "a").unwrap();
        assert_eq!(a.kind, AppointmentType::Massage);
        assert_eq!(a.notes.as_deref(), Some("knee"));
        assert_eq!(a.location, None);
        assert_eq!(a.updated_at, now);
    }
}
