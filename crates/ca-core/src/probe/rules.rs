//! Rule evaluation: captured results in, ordered findings out.
//!
//! Each function here is pure over a [`RunResult`] or the help text, so every
//! rule can be exercised without spawning a process. Order of the returned
//! findings is part of the report contract.

use crate::analyze::{
    contains_noisy_marker, find_flag_mentions, has_ansi, has_carriage_return, looks_like_help,
    ConventionFlag, FlagMentions,
};
use crate::runner::{RunOutcome, RunResult};
use ca_common::Finding;

/// A help-text convention: predicate over flag mentions plus the messages for
/// each side.
pub struct ConventionRule {
    pub present: fn(&FlagMentions) -> bool,
    pub pass_title: &'static str,
    pub warn_title: &'static str,
    pub remediation: &'static str,
}

/// Conventions checked against `--help` output, in report order.
pub const CONVENTION_RULES: &[ConventionRule] = &[
    ConventionRule {
        present: |m| m.is_mentioned(ConventionFlag::Version),
        pass_title: "Help mentions --version",
        warn_title: "Help does not mention --version",
        remediation: "Consider supporting --version for discoverability.",
    },
    ConventionRule {
        present: |m| m.is_mentioned(ConventionFlag::Json),
        pass_title: "Help mentions --json",
        warn_title: "Help does not mention --json",
        remediation: "If scripts may consume output, consider a structured JSON mode.",
    },
    ConventionRule {
        present: |m| m.is_mentioned(ConventionFlag::Plain),
        pass_title: "Help mentions --plain",
        warn_title: "Help does not mention --plain",
        remediation: "If human output is formatted, a stable plain mode helps scripting.",
    },
    ConventionRule {
        present: |m| {
            m.is_mentioned(ConventionFlag::NoColor) || m.is_mentioned(ConventionFlag::NoColorEnv)
        },
        pass_title: "Help mentions color controls (--no-color and/or NO_COLOR)",
        warn_title: "Help does not mention color controls",
        remediation: "Consider supporting --no-color and NO_COLOR.",
    },
    ConventionRule {
        present: |m| m.is_mentioned(ConventionFlag::NoInput),
        pass_title: "Help mentions --no-input",
        warn_title: "Help does not mention --no-input",
        remediation: "If you prompt, consider a non-interactive escape hatch.",
    },
];

/// An environment override that should switch off ANSI output.
pub struct EnvAnsiRule {
    pub name: &'static str,
    pub key: &'static str,
    pub value: &'static str,
    pub pass_title: &'static str,
    pub warn_title: &'static str,
    pub remediation: &'static str,
}

/// Environment probes re-running `--help`, in report order.
pub const ENV_ANSI_RULES: &[EnvAnsiRule] = &[
    EnvAnsiRule {
        name: "no-color-env",
        key: "NO_COLOR",
        value: "1",
        pass_title: "NO_COLOR=1 produced no ANSI sequences (best-effort check)",
        warn_title: "ANSI still present with NO_COLOR=1",
        remediation: "Consider honoring NO_COLOR to disable color output.",
    },
    EnvAnsiRule {
        name: "dumb-term-env",
        key: "TERM",
        value: "dumb",
        pass_title: "TERM=dumb produced no ANSI sequences (best-effort check)",
        warn_title: "ANSI still present with TERM=dumb",
        remediation: "Consider disabling ANSI when TERM=dumb.",
    },
];

fn stderr_or_unknown(result: &RunResult) -> String {
    let stderr = result.stderr.trim();
    if stderr.is_empty() {
        "Unknown error.".to_string()
    } else {
        stderr.to_string()
    }
}

fn either_stream(result: &RunResult, predicate: fn(&str) -> bool) -> bool {
    predicate(&result.stdout) || predicate(&result.stderr)
}

/// `<prefix> --help`: must exit 0, print something help-like, on stdout.
pub fn evaluate_help_long(result: &RunResult) -> Vec<Finding> {
    let code = match result.outcome() {
        RunOutcome::TimedOut => {
            return vec![Finding::fail("--help timed out").with_detail("Help should return quickly.")]
        }
        RunOutcome::FailedToStart => {
            return vec![
                Finding::fail("--help failed to execute").with_detail(stderr_or_unknown(result))
            ]
        }
        RunOutcome::Exited(code) => code,
    };

    let mut findings = Vec::with_capacity(3);

    if code == 0 {
        findings.push(Finding::pass("--help exits with code 0"));
    } else {
        findings.push(
            Finding::fail(format!("--help exit code was {}", code))
                .with_detail("Help should exit 0."),
        );
    }

    if !result.has_output() {
        findings.push(Finding::fail("--help produced no output"));
    } else if looks_like_help(&result.combined()) {
        findings.push(Finding::pass(
            "--help output looks like help (usage/options/commands detected)",
        ));
    } else {
        findings.push(
            Finding::warn("--help output did not obviously look like help")
                .with_detail("Check formatting and content."),
        );
    }

    let on_stdout = !result.stdout.trim().is_empty();
    let on_stderr = !result.stderr.trim().is_empty();
    match (on_stdout, on_stderr) {
        (true, false) => findings.push(Finding::pass("Help printed to stdout")),
        (false, true) => findings.push(
            Finding::warn("Help printed to stderr").with_detail(
                "Common convention is help on stdout; stderr is typically for errors.",
            ),
        ),
        _ => findings.push(
            Finding::warn("Help printed to both stdout and stderr")
                .with_detail("Prefer help on stdout; reserve stderr for errors/warnings."),
        ),
    }

    findings
}

/// `<prefix> -h`: recommended, never a hard failure.
pub fn evaluate_help_short(result: &RunResult) -> Vec<Finding> {
    if result.outcome() == RunOutcome::TimedOut {
        return vec![Finding::warn("-h timed out")
            .with_detail("If you support -h, it should return quickly.")];
    }
    if result.success() && result.has_output() {
        return vec![Finding::pass("-h works (exit 0)")];
    }
    vec![Finding::warn("-h did not behave like help").with_detail(
        "If you intentionally use -h for something else, consider avoiding that.",
    )]
}

/// `<prefix> --definitely-not-a-real-flag-xyz`: must fail, on stderr, with a hint.
pub fn evaluate_invalid_flag(result: &RunResult) -> Vec<Finding> {
    let code = match result.outcome() {
        RunOutcome::TimedOut => {
            return vec![Finding::fail("Invalid-flag probe timed out")
                .with_detail("Invalid input should fail fast with guidance.")]
        }
        RunOutcome::FailedToStart => {
            return vec![Finding::fail("Invalid-flag probe failed to execute")
                .with_detail(stderr_or_unknown(result))]
        }
        RunOutcome::Exited(code) => code,
    };

    let mut findings = Vec::with_capacity(4);

    if code == 0 {
        findings.push(
            Finding::fail("Unknown flag returned exit code 0")
                .with_detail("Unknown flags should be an error."),
        );
    } else {
        findings.push(Finding::pass(format!(
            "Unknown flag returns non-zero ({})",
            code
        )));
    }

    if result.stderr.trim().is_empty() {
        findings.push(
            Finding::warn("Unknown-flag error not printed to stderr")
                .with_detail("Prefer errors on stderr."),
        );
    } else {
        findings.push(Finding::pass("Unknown-flag error printed to stderr"));
    }

    let output = format!("{}{}", result.stdout, result.stderr);

    if output.contains(ConventionFlag::Help.token()) {
        findings.push(Finding::pass("Unknown-flag error mentions --help"));
    } else {
        findings.push(
            Finding::warn("Unknown-flag error does not mention --help")
                .with_detail("Consider adding a hint to discover help."),
        );
    }

    if contains_noisy_marker(&output) {
        findings.push(
            Finding::warn("Error output includes a stack trace marker")
                .with_detail("Prefer stack traces only in --debug/--verbose mode."),
        );
    }

    findings
}

/// Convention checks over the text captured by the `--help` probe.
pub fn evaluate_conventions(help_text: &str) -> Vec<Finding> {
    let mentions = find_flag_mentions(help_text);
    CONVENTION_RULES
        .iter()
        .map(|rule| {
            if (rule.present)(&mentions) {
                Finding::pass(rule.pass_title)
            } else {
                Finding::warn(rule.warn_title).with_detail(rule.remediation)
            }
        })
        .collect()
}

/// Color and animation hygiene of the captured (non-TTY) `--help` output.
pub fn evaluate_help_ansi(result: &RunResult) -> Vec<Finding> {
    let mut findings = Vec::with_capacity(2);

    if either_stream(result, has_ansi) {
        findings.push(
            Finding::warn("ANSI escape sequences detected in --help output (captured/non-TTY)")
                .with_detail(
                    "Consider disabling color/formatting when output is not a TTY, or when NO_COLOR is set.",
                ),
        );
    } else {
        findings.push(Finding::pass(
            "No ANSI escape sequences detected in captured --help output",
        ));
    }

    if either_stream(result, has_carriage_return) {
        findings.push(
            Finding::warn("Carriage returns detected in --help output").with_detail(
                "This can indicate animations/progress behavior; ensure you don't animate when not a TTY.",
            ),
        );
    }

    findings
}

/// `--help` re-run under an environment override that should disable color.
pub fn evaluate_env_ansi(rule: &EnvAnsiRule, result: &RunResult) -> Finding {
    if either_stream(result, has_ansi) {
        Finding::warn(rule.warn_title).with_detail(rule.remediation)
    } else {
        Finding::pass(rule.pass_title)
    }
}
