//! Overlap detection between a candidate window and existing bookings.
//!
//! The check is advisory: callers decide, through [`OverlapPolicy`], whether
//! a conflict blocks the write, only warns, or is not looked for at all.

use crate::db::queries::load_for_party_between;
use crate::errors::{AppError, AppResult};
use crate::models::appointment::{Appointment, Party, TimeWindow, short_id};
use crate::models::appointment_type::AppointmentType;
use crate::models::session::Session;
use clap::ValueEnum;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OverlapPolicy {
    /// Conflicts abort the booking.
    #[default]
    Block,
    /// Conflicts are reported, the booking goes through.
    Warn,
    /// No check is performed.
    Off,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlapReport {
    pub has_overlap: bool,
    pub conflicting_ids: Vec<String>,
}

/// Half-open intersection: `[s1,e1)` and `[s2,e2)` conflict iff `s1 < e2 && s2 < e1`.
pub fn windows_overlap(a: &TimeWindow, b: &TimeWindow) -> bool {
    a.start < b.end && b.start < a.end
}

/// Pure check over an already loaded set of appointments.
///
/// Only rows of the same party that are not cancelled and not `exclude_id`
/// are compared.
pub fn find_conflicts(
    candidate: &TimeWindow,
    party: &Party,
    existing: &[Appointment],
    exclude_id: Option<&str>,
) -> OverlapReport {
    let conflicting_ids: Vec<String> = existing
        .iter()
        .filter(|a| party.matches(a))
        .filter(|a| !a.status.is_cancelled())
        .filter(|a| exclude_id != Some(a.id.as_str()))
        .filter(|a| windows_overlap(candidate, &a.window()))
        .map(|a| a.id.clone())
        .collect();

    OverlapReport {
        has_overlap: !conflicting_ids.is_empty(),
        conflicting_ids,
    }
}

/// Load the party's bookings around `candidate` and check them.
pub fn check_party(
    conn: &Connection,
    session: &Session,
    candidate: &TimeWindow,
    party: &Party,
    exclude_id: Option<&str>,
) -> AppResult<OverlapReport> {
    let existing = load_for_party_between(conn, session, party, candidate)?;
    let report = find_conflicts(candidate, party, &existing, exclude_id);

    if report.has_overlap {
        tracing::debug!(
            party = %party,
            conflicts = report.conflicting_ids.len(),
            "overlap detected"
        );
    }
    Ok(report)
}

/// Whether a booking of `kind` should be overlap-checked at all.
pub fn should_check(
    policy: OverlapPolicy,
    double_booking_types: &[AppointmentType],
    kind: AppointmentType,
    skip_flag: bool,
) -> bool {
    !skip_flag && policy != OverlapPolicy::Off && !double_booking_types.contains(&kind)
}

/// Conflicts found for one party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub party: Party,
    pub ids: Vec<String>,
}

/// Check both the staff member and the athlete of a booking.
pub fn check_parties(
    conn: &Connection,
    session: &Session,
    candidate: &TimeWindow,
    staff_id: &str,
    athlete_id: &str,
    exclude_id: Option<&str>,
) -> AppResult<Vec<Conflict>> {
    let mut conflicts = Vec::new();
    for party in [
        Party::Staff(staff_id.to_string()),
        Party::Athlete(athlete_id.to_string()),
    ] {
        let report = check_party(conn, session, candidate, &party, exclude_id)?;
        if report.has_overlap {
            conflicts.push(Conflict {
                party,
                ids: report.conflicting_ids,
            });
        }
    }
    Ok(conflicts)
}

/// Apply `policy` to conflicts found for the booking described by `label`.
///
/// Under [`OverlapPolicy::Block`] the first conflict becomes an error.
/// Otherwise each conflict is returned as a warning line.
pub fn enforce(policy: OverlapPolicy, label: &str, conflicts: &[Conflict]) -> AppResult<Vec<String>> {
    if policy == OverlapPolicy::Block
        && let Some(first) = conflicts.first()
    {
        return Err(AppError::Overlap {
            party: format!("{} ({label})", first.party),
            ids: first.ids.iter().map(|id| short_id(id).to_string()).collect(),
        });
    }

    Ok(conflicts
        .iter()
        .map(|c| {
            let ids: Vec<&str> = c.ids.iter().map(|id| short_id(id)).collect();
            format!("{label} overlaps {} for {}", ids.join(", "), c.party)
        })
        .collect())
}
