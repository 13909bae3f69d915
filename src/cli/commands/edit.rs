use crate::cli::commands::open_pool;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::series::{EditRequest, SeriesLogic};
use crate::errors::AppResult;
use crate::models::session::Session;
use crate::ui::messages::success;
use chrono::Utc;

pub fn handle(cmd: &Commands, cfg: &Config, session: &Session) -> AppResult<()> {
    if let Commands::Edit {
        id,
        scope,
        kind,
        notes,
        location,
        clear_notes,
        clear_location,
    } = cmd
    {
        let req = EditRequest {
            kind: kind.clone(),
            notes: notes.clone(),
            location: location.clone(),
            clear_notes: *clear_notes,
            clear_location: *clear_location,
        };

        let mut pool = open_pool(cfg)?;
        let n = SeriesLogic::edit(&mut pool, cfg, session, id, *scope, req, Utc::now())?;
        success(format!("{n} appointment(s) updated (scope: {scope})."));
    }
    Ok(())
}
