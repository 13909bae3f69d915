use crate::cli::commands::open_pool;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::status::StatusLogic;
use crate::errors::{AppError, AppResult};
use crate::models::session::Session;
use crate::models::status::AppointmentStatus;
use crate::ui::messages::success;
use chrono::Utc;

pub fn handle(cmd: &Commands, cfg: &Config, session: &Session) -> AppResult<()> {
    if let Commands::Status { id, status } = cmd {
        let status = AppointmentStatus::from_input(status)
            .ok_or_else(|| AppError::InvalidStatus(status.clone()))?;

        let mut pool = open_pool(cfg)?;
        let a = StatusLogic::apply(&mut pool, session, id, status, Utc::now())?;
        success(format!("Appointment {} is now {}.", a.short_id(), a.status));
    }
    Ok(())
}
