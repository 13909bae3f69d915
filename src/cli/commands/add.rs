use crate::cli::commands::{open_pool, print_warnings, resolve_when};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::recurrence::{EndCondition, RecurrenceConfig, parse_weekdays};
use crate::core::schedule::{BookingRequest, ScheduleLogic};
use crate::core::validator::AppointmentDraft;
use crate::errors::{AppError, AppResult};
use crate::models::session::Session;
use crate::ui::messages::{header, info, success};
use crate::utils::date::parse_date_arg;
use chrono::Utc;

/// Book a single appointment or a recurring series.
pub fn handle(cmd: &Commands, cfg: &Config, session: &Session) -> AppResult<()> {
    if let Commands::Add {
        when,
        athlete,
        staff,
        kind,
        status,
        notes,
        location,
        repeat,
        every,
        days,
        count,
        until,
        skip_overlap_check,
        dry_run,
    } = cmd
    {
        //
        // 1. Seed window
        //
        let (starts_at, ends_at) = resolve_when(when, Some(cfg.default_duration_minutes))?;

        //
        // 2. Recurrence
        //
        let days_of_week = match days {
            Some(list) => parse_weekdays(list).map_err(AppError::InvalidWeekday)?,
            None => Vec::new(),
        };
        let end = match (count, until) {
            (Some(n), _) => Some(EndCondition::Count(*n)),
            (None, Some(d)) => Some(EndCondition::Until(parse_date_arg(d)?)),
            (None, None) => None,
        };
        let recurrence = RecurrenceConfig {
            kind: *repeat,
            interval: *every,
            days_of_week,
            end,
        };

        //
        // 3. Book
        //
        let req = BookingRequest {
            draft: AppointmentDraft {
                org_id: session.org_id.clone(),
                athlete_id: athlete.clone(),
                staff_id: staff.clone(),
                kind: kind
                    .clone()
                    .or_else(|| Some(cfg.default_type.to_db_str().to_string())),
                status: status.clone(),
                starts_at: Some(starts_at),
                ends_at,
                notes: notes.clone(),
                location: location.clone(),
            },
            recurrence: recurrence.clone(),
            skip_overlap_check: *skip_overlap_check,
            dry_run: *dry_run,
        };

        let mut pool = open_pool(cfg)?;
        let outcome = ScheduleLogic::book(&mut pool, cfg, session, req, Utc::now())?;

        print_warnings(&outcome.warnings);

        if !outcome.saved {
            header(format!(
                "Dry run: {} appointment(s) would be booked",
                outcome.appointments.len()
            ));
        }

        for (i, a) in outcome.appointments.iter().enumerate() {
            println!("  #{:<3} {}  {}  {}", i + 1, a.window, a.kind.label(), a.id);
        }

        if !outcome.saved {
            info("Nothing was saved.");
        } else if let Some(sid) = &outcome.series_id {
            success(format!(
                "Series {sid} booked: {} appointment(s), {}",
                outcome.appointments.len(),
                recurrence.describe()
            ));
        } else {
            success("Appointment booked.");
        }
    }

    Ok(())
}
