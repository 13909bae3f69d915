use crate::cli::commands::{appointments_table, open_pool};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::recurrence::RecurrenceConfig;
use crate::core::series::find_series;
use crate::errors::AppResult;
use crate::models::session::Session;
use crate::ui::messages::{header, warning};
use crate::utils::time::{fmt_ts, format_minutes};

pub fn handle(cmd: &Commands, cfg: &Config, session: &Session) -> AppResult<()> {
    if let Commands::Show { id } = cmd {
        let pool = open_pool(cfg)?;
        let (a, series) = find_series(&pool.conn, session, id)?;

        header(format!("Appointment {}", a.id));
        println!("  Type:      {}", a.kind.label());
        println!("  Status:    {}", a.status);
        println!("  When:      {} ({})", a.window(), format_minutes(a.window().minutes()));
        println!("  Staff:     {}", a.staff_id);
        println!("  Athlete:   {}", a.athlete_id);
        if let Some(org) = &a.org_id {
            println!("  Org:       {org}");
        }
        if let Some(loc) = &a.location {
            println!("  Location:  {loc}");
        }
        if let Some(notes) = &a.notes {
            println!("  Notes:     {notes}");
        }
        if let Some(at) = a.cancelled_at {
            println!("  Cancelled: {}", fmt_ts(at));
        }
        println!("  Created:   {}", fmt_ts(a.created_at));
        println!("  Updated:   {}", fmt_ts(a.updated_at));

        let Some(sid) = &a.series_id else {
            return Ok(());
        };

        match RecurrenceConfig::from_rule(a.recurrence_rule.as_deref()) {
            Ok(rule) => println!("  Repeats:   {}", rule.describe()),
            Err(e) => warning(format!("Stored recurrence rule is unreadable: {e}")),
        }
        println!("  Series:    {sid}\n");

        header(format!("Series ({} active occurrence(s))", series.len()));
        print!("{}", appointments_table(&series).render());
    }
    Ok(())
}
