//! Fuzz target for probe rule evaluation.
//!
//! Builds a RunResult from arbitrary parts and checks that every rule stays
//! total and that the help probe never emits more than its three findings.

#![no_main]

use arbitrary::Arbitrary;
use ca_core::probe::rules::{
    evaluate_conventions, evaluate_env_ansi, evaluate_help_ansi, evaluate_help_long,
    evaluate_help_short, evaluate_invalid_flag, ENV_ANSI_RULES,
};
use ca_core::RunResult;
use libfuzzer_sys::fuzz_target;
use std::time::Duration;

#[derive(Debug, Arbitrary)]
struct FuzzResult {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    exit_code: Option<i32>,
    timed_out: bool,
}

fuzz_target!(|input: FuzzResult| {
    let result = RunResult {
        argv: vec!["target".to_string()],
        stdout: String::from_utf8_lossy(&input.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&input.stderr).into_owned(),
        exit_code: if input.timed_out { None } else { input.exit_code },
        timed_out: input.timed_out,
        truncated: false,
        duration: Duration::ZERO,
    };

    assert!(evaluate_help_long(&result).len() <= 3);
    assert_eq!(evaluate_help_short(&result).len(), 1);
    let _ = evaluate_invalid_flag(&result);
    let _ = evaluate_conventions(&result.combined());
    let _ = evaluate_help_ansi(&result);
    for rule in ENV_ANSI_RULES {
        let _ = evaluate_env_ansi(rule, &result);
    }
});
