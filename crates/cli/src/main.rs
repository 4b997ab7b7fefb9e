// gymdesk CLI - headless membership data maintenance

mod db;
mod exit_codes;
mod recon;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use gymdesk_config::Settings;

use exit_codes::{EXIT_ERROR, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "gymdesk")]
#[command(about = "Membership data maintenance (headless)")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GYMDESK_COMMIT"), ")"))]
struct Cli {
    /// Settings file to use instead of the one in the user config dir
    #[arg(long, global = true, env = "GYMDESK_SETTINGS", value_name = "PATH")]
    settings: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backfill package and pass count on completed payments
    Recon {
        #[command(subcommand)]
        command: recon::ReconCommands,
    },

    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: db::DbCommands,
    },
}

fn init_logging(settings: &Settings, quiet: bool) {
    let filter = if quiet { "warn" } else { settings.log_filter() };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_timestamp_secs()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    init_logging(&settings, cli.quiet);

    let result = match cli.command {
        Commands::Recon { command } => recon::cmd_recon(command, &settings),
        Commands::Db { command } => db::cmd_db(command, &settings),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
