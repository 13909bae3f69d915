pub mod add;
pub mod backup;
pub mod cancel;
pub mod check;
pub mod config;
pub mod db;
pub mod del;
pub mod edit;
pub mod export;
pub mod init;
pub mod list;
pub mod log;
pub mod move_cmd;
pub mod show;
pub mod status;

use crate::cli::parser::WhenArgs;
use crate::config::Config;
use crate::db::initialize::init_db;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::models::appointment::Appointment;
use crate::ui::messages::warning;
use crate::utils::date::parse_date_arg;
use crate::utils::table::Table;
use crate::utils::time::{at_utc, format_minutes, parse_time_arg};
use chrono::{DateTime, Duration, Utc};

/// Open the configured database, applying pending migrations first.
pub(crate) fn open_pool(cfg: &Config) -> AppResult<DbPool> {
    let pool = DbPool::new(&cfg.database)?;
    init_db(&pool.conn)?;
    Ok(pool)
}

/// Start and optional end of a `WhenArgs` block.
///
/// The end comes from `--out`, else `--duration`, else `default_minutes`.
pub(crate) fn resolve_when(
    when: &WhenArgs,
    default_minutes: Option<i64>,
) -> AppResult<(DateTime<Utc>, Option<DateTime<Utc>>)> {
    let day = parse_date_arg(&when.date)?;
    let start = at_utc(day, parse_time_arg(&when.start)?);

    let end = match (&when.end, when.duration) {
        (Some(out), _) => Some(at_utc(day, parse_time_arg(out)?)),
        (None, Some(minutes)) => Some(start + Duration::minutes(i64::from(minutes))),
        (None, None) => default_minutes.map(|m| start + Duration::minutes(m)),
    };
    Ok((start, end))
}

pub(crate) fn print_warnings(warnings: &[String]) {
    for w in warnings {
        warning(w);
    }
}

/// Render appointments as a table, series marked with `↻`.
pub(crate) fn appointments_table(appts: &[Appointment]) -> Table {
    let mut table = Table::new(&[
        "ID", "Date", "Time", "Dur", "Type", "Status", "Staff", "Athlete", "Location",
    ]);
    for a in appts {
        let id = if a.is_recurring() {
            format!("{} ↻", a.short_id())
        } else {
            a.short_id().to_string()
        };
        table.add_row(vec![
            id,
            a.starts_at.format("%Y-%m-%d %a").to_string(),
            format!("{}-{}", a.starts_at.format("%H:%M"), a.ends_at.format("%H:%M")),
            format_minutes(a.window().minutes()),
            a.kind.label().to_string(),
            a.status.to_string(),
            a.staff_id.clone(),
            a.athlete_id.clone(),
            a.location.clone().unwrap_or_default(),
        ]);
    }
    table
}
