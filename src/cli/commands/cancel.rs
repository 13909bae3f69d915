use crate::cli::commands::open_pool;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::series::SeriesLogic;
use crate::errors::AppResult;
use crate::models::session::Session;
use crate::ui::messages::{info, success};
use chrono::Utc;

pub fn handle(cmd: &Commands, cfg: &Config, session: &Session) -> AppResult<()> {
    if let Commands::Cancel { id, scope } = cmd {
        let mut pool = open_pool(cfg)?;
        let cancelled = SeriesLogic::cancel(&mut pool, session, id, *scope, Utc::now())?;

        if cancelled.is_empty() {
            info("Nothing to cancel.");
            return Ok(());
        }
        for a in &cancelled {
            println!("  ✂️  {}  {}", a.short_id(), a.window());
        }
        success(format!("{} appointment(s) cancelled.", cancelled.len()));
    }
    Ok(())
}
