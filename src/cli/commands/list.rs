use crate::cli::commands::{appointments_table, open_pool};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::queries::{ListFilter, list_filtered};
use crate::errors::{AppError, AppResult};
use crate::models::session::Session;
use crate::models::status::AppointmentStatus;
use crate::ui::messages::{header, info};
use crate::utils::date::{current_month, period_filter};

pub fn handle(cmd: &Commands, cfg: &Config, session: &Session) -> AppResult<()> {
    if let Commands::List {
        period,
        staff,
        athlete,
        status,
        include_cancelled,
    } = cmd
    {
        let period = period.clone().unwrap_or_else(current_month);
        let bounds = period_filter(&period)?;

        let status = match status.as_deref() {
            Some(s) => Some(
                AppointmentStatus::from_input(s)
                    .ok_or_else(|| AppError::InvalidStatus(s.to_string()))?,
            ),
            None => None,
        };

        let filter = ListFilter {
            from: bounds.map(|(from, _)| from),
            to: bounds.map(|(_, to)| to),
            staff_id: staff.clone(),
            athlete_id: athlete.clone(),
            status,
            include_cancelled: *include_cancelled,
        };

        let pool = open_pool(cfg)?;
        let appts = list_filtered(&pool.conn, session, &filter)?;

        if appts.is_empty() {
            info(format!("No appointments found for period {period}."));
            return Ok(());
        }

        header(format!("Appointments for {period}"));
        print!("{}", appointments_table(&appts).render());
        println!("\n{} appointment(s)", appts.len());
    }
    Ok(())
}
