//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | Success                                                   |
//! | 1    | General error (unspecified)                               |
//! | 2    | Usage error (bad flags, missing sources, bad output type) |
//! | 3    | Schema error (missing column, missing sheet, no header)   |
//! | 4    | Input read error (file missing, unreadable, undecodable)  |
//! | 5    | Invalid config (TOML syntax or validation)                |
//! | 6    | Output write error                                        |
//!
//! No report file is left behind for any non-zero code.

use cobranza_recon::ReportError;

/// Success - report written (or sources validated).
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// A source lacks a required column or sheet.
pub const EXIT_SCHEMA: u8 = 3;

/// A source file could not be opened or decoded.
pub const EXIT_INPUT_READ: u8 = 4;

/// Config file unreadable, not valid TOML, or failed validation.
pub const EXIT_INVALID_CONFIG: u8 = 5;

/// The report could not be rendered or written.
pub const EXIT_OUTPUT_WRITE: u8 = 6;

/// Map a ReportError to its exit code.
pub fn report_exit_code(err: &ReportError) -> u8 {
    if err.is_schema() {
        return EXIT_SCHEMA;
    }
    match err {
        ReportError::ConfigParse(_) | ReportError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        ReportError::Io(_) => EXIT_INPUT_READ,
        _ => EXIT_ERROR,
    }
}
