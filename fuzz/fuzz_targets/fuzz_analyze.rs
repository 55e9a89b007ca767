//! Fuzz target for the text heuristics.
//!
//! Captured output is arbitrary bytes from an untrusted program, so every
//! predicate must accept any lossily decoded input without panicking.

#![no_main]

use ca_core::analyze::{
    contains_noisy_marker, find_flag_mentions, has_ansi, has_carriage_return, looks_like_help,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);

    let ansi = has_ansi(&text);
    if !text.contains('\x1b') {
        assert!(!ansi, "escape sequence reported without an ESC byte");
    }

    let _ = has_carriage_return(&text);
    let _ = looks_like_help(&text);
    let _ = contains_noisy_marker(&text);
    let _ = find_flag_mentions(&text).iter().count();
});
