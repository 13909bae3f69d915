use crate::db::migrate::applied_count;
use crate::db::pool::DbPool;
use crate::models::status::AppointmentStatus;
use rusqlite::OptionalExtension;
use std::fs;

const RESET: &str = "\x1b[0m";
const GREY: &str = "\x1b[90m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DbStats {
    pub total: i64,
    /// Rows per status, in [`AppointmentStatus::ALL`] order.
    pub by_status: Vec<(AppointmentStatus, i64)>,
    pub series: i64,
    pub first_start: Option<String>,
    pub last_start: Option<String>,
    pub migrations: i64,
}

pub fn collect(pool: &DbPool) -> rusqlite::Result<DbStats> {
    let conn = &pool.conn;

    let total: i64 = conn.query_row("SELECT COUNT(*) FROM appointments", [], |row| row.get(0))?;

    let mut by_status = Vec::with_capacity(AppointmentStatus::ALL.len());
    for status in AppointmentStatus::ALL {
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM appointments WHERE status = ?1",
            [status.to_db_str()],
            |row| row.get(0),
        )?;
        by_status.push((status, n));
    }

    let series: i64 = conn.query_row(
        "SELECT COUNT(DISTINCT series_id) FROM appointments WHERE series_id IS NOT NULL",
        [],
        |row| row.get(0),
    )?;

    let first_start: Option<String> = conn
        .query_row("SELECT MIN(starts_at) FROM appointments", [], |row| row.get(0))
        .optional()?
        .flatten();
    let last_start: Option<String> = conn
        .query_row("SELECT MAX(starts_at) FROM appointments", [], |row| row.get(0))
        .optional()?
        .flatten();

    Ok(DbStats {
        total,
        by_status,
        series,
        first_start,
        last_start,
        migrations: applied_count(conn)?,
    })
}

pub fn print_db_info(pool: &DbPool, db_path: &str) -> rusqlite::Result<()> {
    let stats = collect(pool)?;
    println!();

    let file_size = fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);
    let file_mb = (file_size as f64) / (1024.0 * 1024.0);

    println!("{CYAN}• File:{RESET} {YELLOW}{db_path}{RESET}");
    println!("{CYAN}• Size:{RESET} {file_mb:.2} MB");
    println!("{CYAN}• Migrations applied:{RESET} {}", stats.migrations);

    println!("{CYAN}• Total appointments:{RESET} {GREEN}{}{RESET}", stats.total);
    for (status, n) in &stats.by_status {
        println!("    {:<12} {n}", status.to_string());
    }
    println!("{CYAN}• Recurring series:{RESET} {}", stats.series);

    let none = format!("{GREY}--{RESET}");
    println!("{CYAN}• Date range:{RESET}");
    println!("    from: {}", stats.first_start.as_deref().unwrap_or(&none));
    println!("    to:   {}", stats.last_start.as_deref().unwrap_or(&none));

    println!();
    Ok(())
}
