//! clubcal library root.
//! Exposes the CLI parser, the high-level `run()` function and the
//! scheduling core (recurrence, overlap checks, validation, batch booking).

pub mod cli;
pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod export;
pub mod models;
pub mod ui;
pub mod utils;

use clap::Parser;
use cli::parser::{Cli, Commands};
use config::Config;
use errors::AppResult;
use models::session::Session;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides `log_filter` from the config file.
pub const LOG_ENV: &str = "CLUBCAL_LOG";

/// Central command dispatcher
pub fn dispatch(cli: &Cli, cfg: &Config, session: &Session) -> AppResult<()> {
    let cmd = &cli.command;
    match cmd {
        Commands::Init => cli::commands::init::handle(cli),
        Commands::Config { .. } => cli::commands::config::handle(cmd, cfg),
        Commands::Db { .. } => cli::commands::db::handle(cmd, cfg),
        Commands::Log { .. } => cli::commands::log::handle(cmd, cfg),
        Commands::Add { .. } => cli::commands::add::handle(cmd, cfg, session),
        Commands::List { .. } => cli::commands::list::handle(cmd, cfg, session),
        Commands::Show { .. } => cli::commands::show::handle(cmd, cfg, session),
        Commands::Check { .. } => cli::commands::check::handle(cmd, cfg, session),
        Commands::Move { .. } => cli::commands::move_cmd::handle(cmd, cfg, session),
        Commands::Edit { .. } => cli::commands::edit::handle(cmd, cfg, session),
        Commands::Status { .. } => cli::commands::status::handle(cmd, cfg, session),
        Commands::Cancel { .. } => cli::commands::cancel::handle(cmd, cfg, session),
        Commands::Del { .. } => cli::commands::del::handle(cmd, cfg, session),
        Commands::Backup { .. } => cli::commands::backup::handle(cmd, cfg),
        Commands::Export { .. } => cli::commands::export::handle(cmd, cfg, session),
    }
}

/// Diagnostics go to stderr so command output stays clean.
fn init_tracing(cfg: &Config) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(&cfg.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Entry point used by main.rs
pub fn run() -> AppResult<()> {
    let cli = Cli::parse();

    let mut cfg = Config::load()?;
    if let Some(custom_db) = &cli.db {
        cfg.database = custom_db.clone();
    }

    init_tracing(&cfg);

    let session = Session::new(
        cli.org.clone().or_else(|| cfg.default_org.clone()),
        cli.actor.clone(),
        cli.role,
    );
    tracing::debug!(org = ?session.org_id, role = ?session.role, db = %cfg.database, "session ready");

    dispatch(&cli, &cfg, &session)
}
