//! Exit codes for the cli-audit binary.
//!
//! Exit codes communicate the audit outcome without requiring output parsing.
//! They are a stable contract for CI scripts:
//! - 0: clean (or WARN-only without --strict)
//! - 1: at least one FAIL, or any WARN with --strict
//! - 2: usage/configuration error, no probe ran
//! - 127: target executable not found, no probe ran

use ca_common::Error;
use serde::{Serialize, Serializer};

/// Exit codes for cli-audit.
///
/// Changes require a major version bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// No FAIL findings (and no WARN findings in strict mode)
    Clean = 0,

    /// FAIL findings present, or WARN findings in strict mode
    Findings = 1,

    /// No command supplied or invalid options
    ArgsError = 2,

    /// Target executable not found on PATH or as a path
    CommandNotFound = 127,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if this exit code indicates an audited, passing target.
    pub fn is_success(self) -> bool {
        self == ExitCode::Clean
    }

    /// Check if the audit never got to run a probe.
    pub fn is_preflight_error(self) -> bool {
        matches!(self, ExitCode::ArgsError | ExitCode::CommandNotFound)
    }

    /// Get the code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::Findings => "ERR_FINDINGS",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::CommandNotFound => "ERR_NOT_FOUND",
        }
    }

    /// Map a pre-flight error onto the exit code contract.
    pub fn for_error(err: &Error) -> Self {
        match err {
            Error::NoCommand | Error::InvalidConfig(_) => ExitCode::ArgsError,
            Error::CommandNotFound { .. } => ExitCode::CommandNotFound,
            // Report could not be written; the audit result is unknown.
            Error::Io(_) | Error::Json(_) => ExitCode::Findings,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

impl Serialize for ExitCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Clean.as_i32(), 0);
        assert_eq!(ExitCode::Findings.as_i32(), 1);
        assert_eq!(ExitCode::ArgsError.as_i32(), 2);
        assert_eq!(ExitCode::CommandNotFound.as_i32(), 127);
        assert_eq!(i32::from(ExitCode::CommandNotFound), 127);
    }

    #[test]
    fn test_exit_code_classification() {
        assert!(ExitCode::Clean.is_success());
        assert!(!ExitCode::Findings.is_success());
        assert!(ExitCode::ArgsError.is_preflight_error());
        assert!(ExitCode::CommandNotFound.is_preflight_error());
        assert!(!ExitCode::Findings.is_preflight_error());
    }

    #[test]
    fn test_exit_code_display() {
        assert_eq!(ExitCode::Clean.to_string(), "OK_CLEAN (0)");
        assert_eq!(ExitCode::CommandNotFound.to_string(), "ERR_NOT_FOUND (127)");
    }

    #[test]
    fn test_for_error() {
        assert_eq!(ExitCode::for_error(&Error::NoCommand), ExitCode::ArgsError);
        assert_eq!(
            ExitCode::for_error(&Error::InvalidConfig("timeout".into())),
            ExitCode::ArgsError
        );
        assert_eq!(
            ExitCode::for_error(&Error::CommandNotFound {
                program: "x".into()
            }),
            ExitCode::CommandNotFound
        );
    }
}
