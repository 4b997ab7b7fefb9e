//! `gymdesk recon` — fuzzy backfill of package references on payments.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::Subcommand;

use gymdesk_config::Settings;
use gymdesk_io::report::write_details_csv;
use gymdesk_io::SqliteStore;
use gymdesk_recon::{ReconConfig, ReconResult, Similarity};

use crate::exit_codes::{recon_exit_code, EXIT_RECON_PARTIAL, EXIT_RECON_RUNTIME};
use crate::CliError;

#[derive(Subcommand)]
pub enum ReconCommands {
    /// Match payment plan titles to packages and fill in the missing fields
    #[command(after_help = "\
Examples:
  gymdesk recon run
  gymdesk recon run --db gym.db --dry-run
  gymdesk recon run --config backfill.recon.toml --json
  gymdesk recon run --report decisions.csv --strict")]
    Run {
        /// SQLite database (defaults to settings, then the user data dir)
        #[arg(long, value_name = "PATH")]
        db: Option<PathBuf>,

        /// Path to a .recon.toml config file (defaults to settings, then built-in defaults)
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Compute decisions without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Output JSON to stdout instead of only the human summary
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Write per-record decisions as CSV
        #[arg(long, value_name = "PATH")]
        report: Option<PathBuf>,

        /// Exit non-zero if any record update was rejected by the database
        #[arg(long)]
        strict: bool,
    },

    /// Validate a recon config without running
    #[command(after_help = "\
Examples:
  gymdesk recon validate backfill.recon.toml")]
    Validate {
        /// Path to the .recon.toml config file
        config: PathBuf,
    },
}

pub fn cmd_recon(cmd: ReconCommands, settings: &Settings) -> Result<(), CliError> {
    match cmd {
        ReconCommands::Run { db, config, dry_run, json, output, report, strict } => {
            cmd_recon_run(settings, db, config, dry_run, json, output, report, strict)
        }
        ReconCommands::Validate { config } => cmd_recon_validate(&config),
    }
}

fn load_config(path: Option<&Path>) -> Result<ReconConfig, CliError> {
    match path {
        Some(path) => ReconConfig::from_path(path)
            .map_err(|e| CliError::new(recon_exit_code(&e), e.to_string())),
        None => Ok(ReconConfig::default()),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_recon_run(
    settings: &Settings,
    db: Option<PathBuf>,
    config_path: Option<PathBuf>,
    dry_run: bool,
    json_output: bool,
    output_file: Option<PathBuf>,
    report_file: Option<PathBuf>,
    strict: bool,
) -> Result<(), CliError> {
    let config_path = config_path.or_else(|| settings.recon_config.clone());
    let mut config = load_config(config_path.as_deref())?;
    if dry_run {
        config.dry_run = true;
    }

    let db_path = db.unwrap_or_else(|| settings.database_path());
    let mut store = SqliteStore::open(&db_path)
        .map_err(|e| {
            CliError::new(EXIT_RECON_RUNTIME, e.to_string())
                .with_hint(format!("create it with: gymdesk db init {}", db_path.display()))
        })?
        .with_completed_status(config.store.completed_status.clone());

    let scorer = config.scorer.build();
    log::debug!("scorer {}, threshold {}", scorer.name(), config.threshold);

    // Engine
    let result = gymdesk_recon::run(&mut store, &scorer, &config, Utc::now())
        .map_err(|e| CliError::new(recon_exit_code(&e), e.to_string()))?;

    // Output
    write_outputs(&result, json_output, output_file.as_deref(), report_file.as_deref())?;

    // Human summary to stderr
    let s = &result.summary;
    eprintln!(
        "recon '{}'{}: {} processed, {} updated, {} skipped ({} failed)",
        result.meta.config_name,
        if result.meta.dry_run { " (dry run)" } else { "" },
        s.processed,
        s.updated,
        s.skipped,
        s.failed,
    );

    if strict && !s.is_clean() {
        return Err(CliError::new(
            EXIT_RECON_PARTIAL,
            format!("{} record update(s) failed", s.failed),
        ));
    }

    Ok(())
}

fn write_outputs(
    result: &ReconResult,
    json_output: bool,
    output_file: Option<&Path>,
    report_file: Option<&Path>,
) -> Result<(), CliError> {
    if json_output || output_file.is_some() {
        let json_str = serde_json::to_string_pretty(result)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;

        if let Some(path) = output_file {
            std::fs::write(path, &json_str)
                .map_err(|e| CliError::io(format!("cannot write output: {e}")))?;
            eprintln!("wrote {}", path.display());
        }

        if json_output {
            println!("{json_str}");
        }
    }

    if let Some(path) = report_file {
        let file = File::create(path)
            .map_err(|e| CliError::io(format!("cannot write report: {e}")))?;
        write_details_csv(&result.details, BufWriter::new(file)).map_err(CliError::io)?;
        eprintln!("wrote {}", path.display());
    }

    Ok(())
}

fn cmd_recon_validate(config_path: &Path) -> Result<(), CliError> {
    let config = load_config(Some(config_path))?;
    eprintln!(
        "valid: recon '{}' using {}, threshold {}",
        config.name,
        config.scorer.build().name(),
        config.threshold,
    );
    Ok(())
}
