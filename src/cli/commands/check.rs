use crate::cli::commands::{open_pool, resolve_when};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::overlap::check_party;
use crate::core::validator::validate_window;
use crate::db::queries::load_by_id;
use crate::errors::{AppError, AppResult};
use crate::models::appointment::{Party, short_id};
use crate::models::session::Session;
use crate::ui::messages::{success, warning};

/// Standalone overlap check. Exits non-zero when the slot is taken.
pub fn handle(cmd: &Commands, cfg: &Config, session: &Session) -> AppResult<()> {
    if let Commands::Check {
        when,
        staff,
        athlete,
        exclude,
    } = cmd
    {
        let mut parties = Vec::new();
        if let Some(s) = staff {
            parties.push(Party::Staff(s.clone()));
        }
        if let Some(a) = athlete {
            parties.push(Party::Athlete(a.clone()));
        }
        if parties.is_empty() {
            return Err(AppError::Other("pass --staff and/or --athlete".into()));
        }

        let (start, end) = resolve_when(when, Some(cfg.default_duration_minutes))?;
        let window = validate_window(Some(start), end)?;

        let pool = open_pool(cfg)?;
        let exclude_id = match exclude {
            Some(id) => Some(load_by_id(&pool.conn, session, id)?.id),
            None => None,
        };

        let mut busy = Vec::new();
        let mut ids = Vec::new();
        for party in &parties {
            let report = check_party(&pool.conn, session, &window, party, exclude_id.as_deref())?;
            if report.has_overlap {
                let short: Vec<&str> = report.conflicting_ids.iter().map(|id| short_id(id)).collect();
                warning(format!("{party} is busy: {}", short.join(", ")));
                busy.push(party.to_string());
                ids.extend(short.into_iter().map(str::to_string));
            } else {
                success(format!("{party} is free {window}"));
            }
        }

        if !busy.is_empty() {
            return Err(AppError::Overlap {
                party: busy.join(", "),
                ids,
            });
        }
    }
    Ok(())
}
