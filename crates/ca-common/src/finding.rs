//! Audit findings and their severities.

use serde::{Deserialize, Serialize};

/// Severity of a single finding.
///
/// Ordered: `Pass < Warn < Fail`. `Warn` is a recommendation, `Fail` a hard
/// requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Pass,
    Warn,
    Fail,
}

impl Severity {
    /// Stable uppercase label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Pass => "PASS",
            Severity::Warn => "WARN",
            Severity::Fail => "FAIL",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One observation produced by a probe rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Finding {
    pub fn new(severity: Severity, title: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.into(),
            detail: None,
        }
    }

    pub fn pass(title: impl Into<String>) -> Self {
        Self::new(Severity::Pass, title)
    }

    pub fn warn(title: impl Into<String>) -> Self {
        Self::new(Severity::Warn, title)
    }

    pub fn fail(title: impl Into<String>) -> Self {
        Self::new(Severity::Fail, title)
    }

    /// Attach remediation or diagnostic text. Blank text is dropped.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        self.detail = if detail.trim().is_empty() {
            None
        } else {
            Some(detail)
        };
        self
    }

    pub fn is_fail(&self) -> bool {
        self.severity == Severity::Fail
    }

    pub fn is_warn(&self) -> bool {
        self.severity == Severity::Warn
    }
}
