use crate::core::recurrence::RecurrenceKind;
use crate::core::series::Scope;
use crate::export::ExportFormat;
use crate::models::session::Role;
use clap::{Args, Parser, Subcommand};

/// Command-line interface definition for clubcal
/// Appointment scheduling for gyms and coaching studios, backed by SQLite
#[derive(Parser)]
#[command(
    name = "clubcal",
    version = env!("CARGO_PKG_VERSION"),
    about = "Book one-off and recurring appointments between staff and athletes, with overlap checks",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    /// Tenant (organisation) to act on; defaults to `default_org` in the config
    #[arg(global = true, long = "org", value_name = "ORG_ID")]
    pub org: Option<String>,

    /// Identity of the caller; required with `--role athlete`
    #[arg(global = true, long = "as", value_name = "PROFILE_ID")]
    pub actor: Option<String>,

    /// Caller role
    #[arg(global = true, long = "role", value_enum, default_value = "trainer")]
    pub role: Role,

    #[command(subcommand)]
    pub command: Commands,
}

/// Start and end of a booking on one calendar day.
#[derive(Args, Debug, Clone)]
pub struct WhenArgs {
    /// Day (YYYY-MM-DD, UTC)
    pub date: String,

    /// Start time (HH:MM)
    #[arg(long = "in", value_name = "HH:MM")]
    pub start: String,

    /// End time (HH:MM), same day as the start
    #[arg(long = "out", value_name = "HH:MM", conflicts_with = "duration")]
    pub end: Option<String>,

    /// Duration in minutes instead of --out
    #[arg(long, value_name = "MINUTES")]
    pub duration: Option<u32>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Manage the configuration file (view or edit)
    Config {
        #[arg(long = "print", help = "Print the current configuration")]
        print_config: bool,

        #[arg(long = "check", help = "Check configuration file for missing fields")]
        check: bool,

        #[arg(long = "migrate", help = "Add missing fields with their default values")]
        migrate: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/notepad)"
        )]
        edit_config: bool,

        #[arg(
            long = "editor",
            help = "Specify the editor to use (vim, nano, or custom path)"
        )]
        editor: Option<String>,
    },

    /// Manage the database (migrations, integrity checks, etc.)
    Db {
        #[arg(long = "migrate", help = "Run pending database migrations")]
        migrate: bool,

        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "vacuum", help = "Optimize the database using VACUUM")]
        vacuum: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,
    },

    /// Print the internal audit log
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,

        /// Regular expression matched against operation, target and message
        #[arg(long = "filter", value_name = "REGEX")]
        filter: Option<String>,
    },

    /// Book an appointment, optionally repeating
    ///
    /// Examples:
    ///   clubcal add 2024-01-01 --in 10:00 --out 11:00 --athlete a1 --staff s1
    ///   clubcal add 2024-01-01 --in 18:00 --duration 45 --athlete a1 --staff s1 \
    ///       --repeat weekly --days mon,wed --count 8
    #[command(verbatim_doc_comment)]
    Add {
        #[command(flatten)]
        when: WhenArgs,

        #[arg(long, value_name = "ATHLETE_ID")]
        athlete: Option<String>,

        #[arg(long, value_name = "STAFF_ID")]
        staff: Option<String>,

        /// training, trial, assessment, first_visit, meeting, massage, nutrition
        #[arg(long = "type", value_name = "TYPE")]
        kind: Option<String>,

        /// active, completed, cancelled, in_progress (default: active)
        #[arg(long)]
        status: Option<String>,

        #[arg(long)]
        notes: Option<String>,

        #[arg(long)]
        location: Option<String>,

        /// Repeat pattern
        #[arg(long, value_enum, default_value = "none")]
        repeat: RecurrenceKind,

        /// Repeat every N days/weeks/months
        #[arg(long, value_name = "N", default_value_t = 1)]
        every: u32,

        /// Weekdays for weekly repeats, e.g. `mon,thu` or `1,4`
        #[arg(long, value_name = "DAYS")]
        days: Option<String>,

        /// Total number of occurrences, first one included
        #[arg(long, conflicts_with = "until")]
        count: Option<u32>,

        /// Last day (inclusive, YYYY-MM-DD) an occurrence may start on
        #[arg(long, value_name = "DATE")]
        until: Option<String>,

        #[arg(long, help = "Book even if staff or athlete are already busy")]
        skip_overlap_check: bool,

        #[arg(long, help = "Show what would be booked without saving")]
        dry_run: bool,
    },

    /// List appointments
    List {
        /// Filter by period.
        ///
        /// Supported formats:
        /// - YYYY, YYYY-MM, YYYY-MM-DD
        /// - ranges start:end in the same format (e.g. "2025-06:2025-08")
        /// - all → no date filtering
        ///
        /// If omitted, the default is the current month.
        #[arg(long, short, help = "Filter by year/month/day or a custom range")]
        period: Option<String>,

        #[arg(long, value_name = "STAFF_ID")]
        staff: Option<String>,

        #[arg(long, value_name = "ATHLETE_ID")]
        athlete: Option<String>,

        #[arg(long)]
        status: Option<String>,

        #[arg(long = "all", help = "Include cancelled appointments")]
        include_cancelled: bool,
    },

    /// Show one appointment and its series
    Show {
        /// Appointment id or unambiguous prefix
        id: String,
    },

    /// Check whether a slot is free for a staff member and/or an athlete
    Check {
        #[command(flatten)]
        when: WhenArgs,

        #[arg(long, value_name = "STAFF_ID")]
        staff: Option<String>,

        #[arg(long, value_name = "ATHLETE_ID")]
        athlete: Option<String>,

        /// Ignore this appointment (the one being moved)
        #[arg(long, value_name = "ID")]
        exclude: Option<String>,
    },

    /// Move an appointment to a new time
    Move {
        id: String,

        /// New time; without --out/--duration the current duration is kept
        #[command(flatten)]
        when: WhenArgs,

        #[arg(long, help = "Move even if staff or athlete are already busy")]
        skip_overlap_check: bool,
    },

    /// Change type, notes or location of an appointment or its series
    Edit {
        id: String,

        #[arg(long, value_enum, default_value = "single")]
        scope: Scope,

        #[arg(long = "type", value_name = "TYPE")]
        kind: Option<String>,

        #[arg(long, conflicts_with = "clear_notes")]
        notes: Option<String>,

        #[arg(long, conflicts_with = "clear_location")]
        location: Option<String>,

        #[arg(long)]
        clear_notes: bool,

        #[arg(long)]
        clear_location: bool,
    },

    /// Set the status of an appointment
    Status {
        id: String,

        /// active, completed, cancelled, in_progress
        status: String,
    },

    /// Cancel an appointment, the rest of its series, or the whole series
    Cancel {
        id: String,

        #[arg(long, value_enum, default_value = "single")]
        scope: Scope,
    },

    /// Permanently delete an appointment (or its whole series)
    Del {
        id: String,

        #[arg(long, help = "Delete every occurrence of the series")]
        series: bool,

        #[arg(long, short = 'y', help = "Do not ask for confirmation")]
        yes: bool,
    },

    /// Create a backup copy of the database
    Backup {
        /// Destination file path
        #[arg(long, value_name = "FILE")]
        file: String,

        /// Compress the backup (zip)
        #[arg(long)]
        compress: bool,

        /// Overwrite without confirmation
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Export appointments
    Export {
        #[arg(long, value_enum, default_value = "csv")]
        format: ExportFormat,

        /// Output file path (absolute path required)
        #[arg(long, value_name = "FILE")]
        file: String,

        /// Same formats as `list --period`; omitted or `all` exports everything
        #[arg(long, value_name = "RANGE")]
        range: Option<String>,

        /// Overwrite output file without confirmation
        #[arg(long, short = 'f')]
        force: bool,
    },
}
