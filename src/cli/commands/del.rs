use crate::cli::commands::open_pool;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::del::DeleteLogic;
use crate::errors::AppResult;
use crate::models::session::Session;
use crate::ui::messages::{confirm, info, success};

pub fn handle(cmd: &Commands, cfg: &Config, session: &Session) -> AppResult<()> {
    if let Commands::Del { id, series, yes } = cmd {
        session.ensure_can_write()?;
        let mut pool = open_pool(cfg)?;

        //
        // Confirmation prompt
        //
        if !*yes {
            let targets = DeleteLogic::targets(&pool, session, id, *series)?;
            let prompt = match targets.as_slice() {
                [one] => format!(
                    "Delete appointment {} ({})? This action is irreversible.",
                    one.short_id(),
                    one.window()
                ),
                many => format!(
                    "Delete ALL {} appointments of this series? This action is irreversible.",
                    many.len()
                ),
            };
            if !confirm(&prompt) {
                info("Operation cancelled.");
                return Ok(());
            }
        }

        let n = DeleteLogic::apply(&mut pool, session, id, *series)?;
        success(format!("{n} appointment(s) deleted."));
    }
    Ok(())
}
