//! Error types for CLI Audit.
//!
//! Only the pre-flight stage can fail. Once probing starts, every failure
//! mode of the target (timeout, spawn failure, garbage output) is carried as
//! data in a `RunResult` or a `Finding`, never as an `Error`.
//!
//! # Human-Facing Output
//!
//! ```text
//! Error: command not found: mytool
//!   Fix: Check the spelling, or pass a path such as ./mytool
//! ```

use thiserror::Error;

/// Result type alias for CLI Audit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for CLI Audit.
#[derive(Error, Debug)]
pub enum Error {
    #[error("no command provided")]
    NoCommand,

    #[error("command not found: {program}")]
    CommandNotFound { program: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Invocation/configuration errors
    /// - 20-29: Target resolution errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::NoCommand => 10,
            Error::InvalidConfig(_) => 11,
            Error::CommandNotFound { .. } => 20,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            Error::NoCommand => Some("Usage: cli-audit [OPTIONS] -- <command> [args...]"),
            Error::CommandNotFound { .. } => {
                Some("Check the spelling, or pass a path such as ./mytool")
            }
            Error::InvalidConfig(_) => Some("Run 'cli-audit --help' for valid options"),
            Error::Io(_) | Error::Json(_) => None,
        }
    }
}
