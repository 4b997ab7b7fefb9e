//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: cron jobs and scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, missing file) |
//! | 60-69   | recon            | Reconciliation run codes                 |
//! | 70-79   | db               | Database maintenance codes               |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use gymdesk_recon::ReconError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
/// Emitted by clap itself.
#[allow(dead_code)]
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Recon (60-69)
// =============================================================================

/// Recon config failed to parse or validate.
pub const EXIT_RECON_INVALID_CONFIG: u8 = 60;

/// Run could not start: unreadable config or database, records or catalog
/// failed to load.
pub const EXIT_RECON_RUNTIME: u8 = 61;

/// `--strict` was given and at least one record update was rejected.
pub const EXIT_RECON_PARTIAL: u8 = 62;

// =============================================================================
// Db (70-79)
// =============================================================================

/// Database could not be created or its schema initialised.
pub const EXIT_DB_INIT: u8 = 70;

/// Map a ReconError to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_RECON_INVALID_CONFIG,
        ReconError::Load { .. } | ReconError::Io(_) => EXIT_RECON_RUNTIME,
    }
}
