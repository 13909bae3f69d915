use crate::cli::commands::{open_pool, print_warnings, resolve_when};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::reschedule::RescheduleLogic;
use crate::errors::AppResult;
use crate::models::appointment::short_id;
use crate::models::session::Session;
use crate::ui::messages::success;
use chrono::Utc;

pub fn handle(cmd: &Commands, cfg: &Config, session: &Session) -> AppResult<()> {
    if let Commands::Move {
        id,
        when,
        skip_overlap_check,
    } = cmd
    {
        let (start, end) = resolve_when(when, None)?;

        let mut pool = open_pool(cfg)?;
        let out = RescheduleLogic::apply(
            &mut pool,
            cfg,
            session,
            id,
            start,
            end,
            *skip_overlap_check,
            Utc::now(),
        )?;

        print_warnings(&out.warnings);
        success(format!(
            "Appointment {} moved: {} ⇒ {}",
            short_id(&out.id),
            out.from,
            out.to
        ));
    }
    Ok(())
}
