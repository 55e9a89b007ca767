//! CLI Audit common types and errors.
//!
//! This crate provides foundational types shared across ca-core modules:
//! - Finding severities and the finding record itself
//! - Common error types
//! - Report output formats
//! - Audit configuration and validation

pub mod config;
pub mod error;
pub mod finding;
pub mod output;

pub use config::{AuditConfig, DEFAULT_TIMEOUT_SECS};
pub use error::{Error, Result};
pub use finding::{Finding, Severity};
pub use output::OutputFormat;
