//! CLI Audit core library.
//!
//! Runs a target command-line program under a fixed set of controlled
//! invocations and grades its behavior against common CLI conventions:
//! - Process execution with timeouts and process-group cleanup
//! - Text heuristics over captured output
//! - The probe sequence and its rules
//! - Verdict aggregation, exit codes, and report rendering
//!
//! The binary entry point is in `main.rs`.

pub mod aggregate;
pub mod analyze;
pub mod exit_codes;
pub mod logging;
pub mod probe;
pub mod report;
pub mod resolve;
pub mod runner;

pub use aggregate::Verdict;
pub use exit_codes::ExitCode;
pub use probe::{AuditReport, ProbeSuite};
pub use runner::{Invocation, ProcessRunner, RunOutcome, RunResult};
