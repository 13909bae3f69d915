use crate::ui::messages::success;
use rusqlite::{Connection, OptionalExtension, Result};

/// Ensure that the `log` table exists. It also stores the migration ledger.
fn ensure_log_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn is_applied(conn: &Connection, version: &str) -> Result<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

fn mark_applied(conn: &Connection, version: &str, message: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'), 'migration_applied', ?1, ?2)",
        [version, message],
    )?;
    Ok(())
}

/// Create the `appointments` table. Enum and ordering invariants are
/// repeated as CHECK constraints so that no writer can bypass them.
fn create_appointments_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS appointments (
            id               TEXT PRIMARY KEY NOT NULL,
            org_id           TEXT,
            athlete_id       TEXT NOT NULL CHECK(length(trim(athlete_id)) > 0),
            staff_id         TEXT NOT NULL CHECK(length(trim(staff_id)) > 0),
            kind             TEXT NOT NULL CHECK(kind IN (
                                 'training','trial','assessment','first_visit',
                                 'meeting','massage','nutrition')),
            status           TEXT NOT NULL DEFAULT 'active' CHECK(status IN (
                                 'active','completed','cancelled','in_progress')),
            starts_at        TEXT NOT NULL,
            ends_at          TEXT NOT NULL,
            notes            TEXT,
            location         TEXT,
            recurrence_rule  TEXT,
            series_id        TEXT,
            cancelled_at     TEXT,
            created_at       TEXT NOT NULL,
            updated_at       TEXT NOT NULL,
            CHECK(ends_at > starts_at)
        );

        CREATE INDEX IF NOT EXISTS idx_appt_staff_start ON appointments(staff_id, starts_at);
        CREATE INDEX IF NOT EXISTS idx_appt_athlete_start ON appointments(athlete_id, starts_at);
        "#,
    )?;
    Ok(())
}

fn create_series_and_org_indexes(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE INDEX IF NOT EXISTS idx_appt_series ON appointments(series_id);
        CREATE INDEX IF NOT EXISTS idx_appt_org ON appointments(org_id);
        "#,
    )?;
    Ok(())
}

type Step = fn(&Connection) -> Result<()>;

/// Ordered list of schema steps. Never reorder or edit an entry once
/// released; append a new one instead.
const MIGRATIONS: &[(&str, &str, Step)] = &[
    (
        "20240110_0001_create_appointments",
        "Created appointments table",
        create_appointments_table,
    ),
    (
        "20240305_0002_series_and_org_indexes",
        "Added series and org indexes",
        create_series_and_org_indexes,
    ),
];

/// Public entry point: run all pending migrations.
///
/// Invoked by db::init_db(). Each step runs in its own transaction together
/// with its ledger entry. Returns how many steps were applied.
pub fn run_pending_migrations(conn: &Connection) -> Result<usize> {
    ensure_log_table(conn)?;

    let mut applied = 0;
    for (version, message, step) in MIGRATIONS {
        if is_applied(conn, version)? {
            continue;
        }

        let tx = conn.unchecked_transaction()?;
        step(&tx)?;
        mark_applied(&tx, version, message)?;
        tx.commit()?;

        tracing::info!(version, "migration applied");
        success(format!("Migration applied: {version} → {message}"));
        applied += 1;
    }

    Ok(applied)
}

pub fn applied_count(conn: &Connection) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM log WHERE operation = 'migration_applied'",
        [],
        |row| row.get(0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(run_pending_migrations(&conn).unwrap(), MIGRATIONS.len());
        assert_eq!(run_pending_migrations(&conn).unwrap(), 0);
        assert_eq!(applied_count(&conn).unwrap(), MIGRATIONS.len() as i64);
    }

    #[test]
    fn schema_rejects_inverted_windows() {
        let conn = Connection::open_in_memory().unwrap();
        run_pending_migrations(&conn).unwrap();
        let res = conn.execute(
            "INSERT INTO appointments (id, athlete_id, staff_id, kind, starts_at, ends_at, created_at, updated_at)
             VALUES ('x', 'a', 's', 'training', '2024-01-01T11:00:00Z', '2024-01-01T10:00:00Z', 'now', 'now')",
            [],
        );
        assert!(res.is_err());
    }
}
