//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: month-end scripts branch on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, bad values)   |
//! | 60-69   | tieout           | Tie-out input, config and output codes   |
//!
//! A tie-out that runs to completion exits 0 even when the variance is
//! non-zero or contracts were dropped by the join; those are reported, not
//! failures.
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `tieout_exit_code` or the command's error handling

use tieout_recon::ReconError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unparseable payment total or date.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Tie-out (60-69)
// =============================================================================

/// An input workbook (payment, portfolio, prior period) or the config file
/// cannot be opened or read.
pub const EXIT_TIEOUT_SOURCE_NOT_FOUND: u8 = 60;

/// A workbook does not fit the configured layout (missing columns, header
/// names not found, prior-period row count differs).
pub const EXIT_TIEOUT_SCHEMA: u8 = 61;

/// A cell that must hold an amount does not parse as one.
pub const EXIT_TIEOUT_COERCION: u8 = 62;

/// Config file failed to parse or validate, or the run parameters are
/// inconsistent (e.g. buyout layout with cut row 0).
pub const EXIT_TIEOUT_INVALID_CONFIG: u8 = 63;

/// The report workbook could not be written.
pub const EXIT_TIEOUT_WRITE: u8 = 64;

/// Map an engine error to its exit code.
pub fn tieout_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::SourceNotFound { .. } => EXIT_TIEOUT_SOURCE_NOT_FOUND,
        ReconError::SchemaMismatch { .. } => EXIT_TIEOUT_SCHEMA,
        ReconError::TypeCoercion { .. } => EXIT_TIEOUT_COERCION,
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_TIEOUT_INVALID_CONFIG,
        ReconError::Write { .. } => EXIT_TIEOUT_WRITE,
    }
}
