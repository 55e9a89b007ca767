//! Audit configuration.
//!
//! Populated from CLI flags (with `CLI_AUDIT_*` env fallbacks handled by
//! clap) and validated before any probe runs.

use crate::error::{Error, Result};
use crate::output::OutputFormat;
use std::time::Duration;

/// Default per-invocation timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: f64 = 10.0;

/// Settings for a single audit run.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditConfig {
    /// Wall-clock bound for each probe invocation.
    pub timeout: Duration,
    /// Treat WARN as FAIL for exit status purposes.
    pub strict: bool,
    /// Echo raw stdout/stderr of the help and invalid-flag probes.
    pub print_output: bool,
    /// Report format.
    pub format: OutputFormat,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS),
            strict: false,
            print_output: false,
            format: OutputFormat::Text,
        }
    }
}

impl AuditConfig {
    /// Convert a user-supplied number of seconds into a timeout.
    ///
    /// Rejects zero, negative, NaN, and infinite values.
    pub fn timeout_from_secs(secs: f64) -> Result<Duration> {
        if !secs.is_finite() || secs <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "timeout must be a positive number of seconds, got {}",
                secs
            )));
        }
        Duration::try_from_secs_f64(secs)
            .map_err(|e| Error::InvalidConfig(format!("timeout out of range: {}", e)))
    }

    /// Set the per-probe timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable or disable strict mode.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Enable or disable raw output echo.
    pub fn with_print_output(mut self, print_output: bool) -> Self {
        self.print_output = print_output;
        self
    }

    /// Set the report format.
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Check invariants that a builder could have violated.
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(Error::InvalidConfig("timeout must be positive".to_string()));
        }
        Ok(())
    }
}
