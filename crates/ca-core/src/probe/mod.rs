//! The fixed probe sequence.
//!
//! [`ProbeSuite::run`] executes, in order:
//!
//! 1. `help-long`: `<prefix> --help`
//! 2. `help-short`: `<prefix> -h`
//! 3. `invalid-flag`: `<prefix> --definitely-not-a-real-flag-xyz`
//! 4. convention checks on the `help-long` capture (no new process)
//! 5. ANSI/animation checks on the `help-long` capture (no new process)
//! 6. `no-color-env`: `<prefix> --help` with `NO_COLOR=1`
//! 7. `dumb-term-env`: `<prefix> --help` with `TERM=dumb`
//!
//! Each invocation runs exactly once. Findings are appended in that order,
//! and within a step in the order the rules in [`rules`] emit them.

pub mod rules;

use crate::runner::{Invocation, ProcessRunner, RunResult};
use ca_common::Finding;
use rules::ENV_ANSI_RULES;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Flag that no real CLI should accept.
pub const INVALID_FLAG: &str = "--definitely-not-a-real-flag-xyz";

/// One of the invocations the suite performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    HelpLong,
    HelpShort,
    InvalidFlag,
    NoColorEnv,
    DumbTermEnv,
}

impl Probe {
    /// Invocations in execution order.
    pub const ALL: [Probe; 5] = [
        Probe::HelpLong,
        Probe::HelpShort,
        Probe::InvalidFlag,
        Probe::NoColorEnv,
        Probe::DumbTermEnv,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Probe::HelpLong => "help-long",
            Probe::HelpShort => "help-short",
            Probe::InvalidFlag => "invalid-flag",
            Probe::NoColorEnv => ENV_ANSI_RULES[0].name,
            Probe::DumbTermEnv => ENV_ANSI_RULES[1].name,
        }
    }

    /// Argument appended to the target prefix.
    pub fn arg(&self) -> &'static str {
        match self {
            Probe::HelpLong | Probe::NoColorEnv | Probe::DumbTermEnv => "--help",
            Probe::HelpShort => "-h",
            Probe::InvalidFlag => INVALID_FLAG,
        }
    }

    /// Environment override injected into this probe's child only.
    pub fn env_override(&self) -> Option<(&'static str, &'static str)> {
        match self {
            Probe::NoColorEnv => Some((ENV_ANSI_RULES[0].key, ENV_ANSI_RULES[0].value)),
            Probe::DumbTermEnv => Some((ENV_ANSI_RULES[1].key, ENV_ANSI_RULES[1].value)),
            _ => None,
        }
    }

    /// Heading used for this probe's raw transcript.
    pub fn transcript_label(&self) -> &'static str {
        match self {
            Probe::InvalidFlag => "invalid flag",
            other => other.arg(),
        }
    }

    /// Build the invocation for `prefix`.
    pub fn invocation(&self, prefix: &Invocation) -> Invocation {
        let invocation = prefix.clone().with_arg(self.arg());
        match self.env_override() {
            Some((key, value)) => invocation.with_env(key, value),
            None => invocation,
        }
    }
}

/// Raw output of a probe, kept for `--print-output`.
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    /// Heading such as `--help` or `invalid flag`.
    pub label: String,
    pub stdout: String,
    pub stderr: String,
}

impl Transcript {
    fn of(probe: Probe, result: &RunResult) -> Self {
        Self {
            label: probe.transcript_label().to_string(),
            stdout: result.stdout.clone(),
            stderr: result.stderr.clone(),
        }
    }
}

/// Everything one audit produced, in report order.
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    /// Target prefix (program plus leading arguments).
    pub target: Vec<String>,
    pub findings: Vec<Finding>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub transcripts: Vec<Transcript>,
}

/// Runs the probe sequence against one target prefix.
#[derive(Debug, Clone)]
pub struct ProbeSuite {
    prefix: Invocation,
    runner: ProcessRunner,
    timeout: Duration,
    capture_transcripts: bool,
}

impl ProbeSuite {
    pub fn new(prefix: Invocation, timeout: Duration) -> Self {
        Self {
            prefix,
            runner: ProcessRunner::with_defaults(),
            timeout,
            capture_transcripts: false,
        }
    }

    /// Use a custom runner.
    pub fn with_runner(mut self, runner: ProcessRunner) -> Self {
        self.runner = runner;
        self
    }

    /// Keep raw stdout/stderr of the help and invalid-flag probes.
    pub fn with_transcripts(mut self, enabled: bool) -> Self {
        self.capture_transcripts = enabled;
        self
    }

    fn execute(&self, probe: Probe) -> RunResult {
        let invocation = probe.invocation(&self.prefix);
        info!(probe = probe.name(), argv = ?invocation.argv(), "running probe");

        let result = self.runner.run(&invocation, self.timeout);
        if result.timed_out {
            warn!(probe = probe.name(), "probe timed out");
        }
        debug!(
            probe = probe.name(),
            outcome = ?result.outcome(),
            stdout_bytes = result.stdout.len(),
            stderr_bytes = result.stderr.len(),
            duration_ms = result.duration.as_millis() as u64,
            "probe finished"
        );
        result
    }

    /// Run every probe once, in order, and collect the findings.
    #[instrument(skip(self), fields(target = ?self.prefix.argv()))]
    pub fn run(&self) -> AuditReport {
        let mut findings = Vec::new();
        let mut transcripts = Vec::new();

        let help = self.execute(Probe::HelpLong);
        findings.extend(rules::evaluate_help_long(&help));
        if self.capture_transcripts {
            transcripts.push(Transcript::of(Probe::HelpLong, &help));
        }

        let short = self.execute(Probe::HelpShort);
        findings.extend(rules::evaluate_help_short(&short));

        let invalid = self.execute(Probe::InvalidFlag);
        findings.extend(rules::evaluate_invalid_flag(&invalid));
        if self.capture_transcripts {
            transcripts.push(Transcript::of(Probe::InvalidFlag, &invalid));
        }

        // Reuse the help-long capture; the target is not re-run for these.
        findings.extend(rules::evaluate_conventions(&help.combined()));
        findings.extend(rules::evaluate_help_ansi(&help));

        for (probe, rule) in [Probe::NoColorEnv, Probe::DumbTermEnv]
            .into_iter()
            .zip(ENV_ANSI_RULES)
        {
            let result = self.execute(probe);
            findings.push(rules::evaluate_env_ansi(rule, &result));
        }

        info!(findings = findings.len(), "probe suite complete");

        AuditReport {
            target: self.prefix.argv(),
            findings,
            transcripts,
        }
    }
}
