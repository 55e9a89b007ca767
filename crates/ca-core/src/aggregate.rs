//! Reduce findings to a verdict and a process exit code.

use crate::exit_codes::ExitCode;
use ca_common::Finding;
use serde::Serialize;

/// Counts over a finding sequence plus the resulting exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub fail: usize,
    pub warn: usize,
    pub exit_code: ExitCode,
}

impl Verdict {
    /// FAIL always fails the run; WARN fails it only in strict mode.
    pub fn from_findings(findings: &[Finding], strict: bool) -> Self {
        let fail = findings.iter().filter(|f| f.is_fail()).count();
        let warn = findings.iter().filter(|f| f.is_warn()).count();

        let exit_code = if fail > 0 || (strict && warn > 0) {
            ExitCode::Findings
        } else {
            ExitCode::Clean
        };

        Self {
            fail,
            warn,
            exit_code,
        }
    }

    pub fn passed(&self) -> bool {
        self.exit_code == ExitCode::Clean
    }
}
