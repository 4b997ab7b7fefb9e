//! `gymdesk db` — database maintenance.

use std::path::PathBuf;

use clap::Subcommand;

use gymdesk_config::Settings;
use gymdesk_io::{SqliteStore, SCHEMA_VERSION};

use crate::exit_codes::EXIT_DB_INIT;
use crate::CliError;

#[derive(Subcommand)]
pub enum DbCommands {
    /// Create the database file and its tables (safe to re-run)
    #[command(after_help = "\
Examples:
  gymdesk db init
  gymdesk db init ./gym.db")]
    Init {
        /// Database path (defaults to settings, then the user data dir)
        path: Option<PathBuf>,
    },
}

pub fn cmd_db(cmd: DbCommands, settings: &Settings) -> Result<(), CliError> {
    match cmd {
        DbCommands::Init { path } => cmd_db_init(path.unwrap_or_else(|| settings.database_path())),
    }
}

fn cmd_db_init(path: PathBuf) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            CliError::new(EXIT_DB_INIT, format!("cannot create {}: {e}", parent.display()))
        })?;
    }

    SqliteStore::create(&path).map_err(|e| CliError::new(EXIT_DB_INIT, e.to_string()))?;
    eprintln!("initialised {} (schema v{SCHEMA_VERSION})", path.display());
    Ok(())
}
