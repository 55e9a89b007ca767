//! Pure text predicates over captured output.
//!
//! Everything here is a heuristic over untrusted external text. False
//! positives and negatives are expected; the predicates are kept stateless so
//! they can be unit tested without spawning anything.

use once_cell::sync::Lazy;
use regex::Regex;

/// Terminal control sequences: CSI, OSC (BEL or ST terminated), and
/// two-character escapes.
static RE_ANSI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\x1b(?:\[[0-?]*[ -/]*[@-~]|\].*?(?:\x07|\x1b\\)|[@-Z\x5C-_])")
        .expect("ANSI pattern is valid")
});

static RE_SHORT_H: Lazy<Regex> = Lazy::new(|| short_flag_regex('h'));
static RE_SHORT_Q: Lazy<Regex> = Lazy::new(|| short_flag_regex('q'));
static RE_SHORT_V: Lazy<Regex> = Lazy::new(|| short_flag_regex('v'));
static RE_SHORT_D: Lazy<Regex> = Lazy::new(|| short_flag_regex('d'));

/// `-x` preceded by start-of-text or whitespace, followed by whitespace, a
/// comma, or end-of-text.
fn short_flag_regex(letter: char) -> Regex {
    Regex::new(&format!(r"(?:^|\s)-{}(?:\s|,|$)", letter)).expect("short flag pattern is valid")
}

/// Substrings (matched case-insensitively) that suggest help output.
const HELP_MARKERS: &[&str] = &["usage:", "\nusage", "synopsis", "options", "commands"];

/// Crash/traceback markers that should not leak outside a debug mode.
pub const NOISY_MARKERS: &[&str] = &[
    "Traceback (most recent call last)",
    "panic:",
    "panicked at",
    "stack trace",
    "Stack trace",
    "Exception in thread \"",
];

/// True if `text` contains any terminal escape sequence.
pub fn has_ansi(text: &str) -> bool {
    // Fast path: no ESC byte, no escape sequence.
    text.contains('\x1b') && RE_ANSI.is_match(text)
}

/// True if `text` contains a carriage return (in-place redraw, spinners).
pub fn has_carriage_return(text: &str) -> bool {
    text.contains('\r')
}

/// Loose check that `text` reads like help output.
pub fn looks_like_help(text: &str) -> bool {
    let lowered = text.to_lowercase();
    HELP_MARKERS.iter().any(|marker| lowered.contains(marker))
}

/// True if `text` contains a stack trace or crash marker.
pub fn contains_noisy_marker(text: &str) -> bool {
    NOISY_MARKERS.iter().any(|marker| text.contains(marker))
}

const FLAG_COUNT: usize = 13;

/// Conventional flags and variables looked for in help text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConventionFlag {
    Help,
    ShortHelp,
    Version,
    Json,
    Plain,
    NoColor,
    NoColorEnv,
    NoInput,
    DryRun,
    Force,
    Quiet,
    Verbose,
    Debug,
}

impl ConventionFlag {
    /// Catalog order.
    pub const ALL: [ConventionFlag; FLAG_COUNT] = [
        ConventionFlag::Help,
        ConventionFlag::ShortHelp,
        ConventionFlag::Version,
        ConventionFlag::Json,
        ConventionFlag::Plain,
        ConventionFlag::NoColor,
        ConventionFlag::NoColorEnv,
        ConventionFlag::NoInput,
        ConventionFlag::DryRun,
        ConventionFlag::Force,
        ConventionFlag::Quiet,
        ConventionFlag::Verbose,
        ConventionFlag::Debug,
    ];

    /// Display token for the flag.
    pub fn token(&self) -> &'static str {
        match self {
            ConventionFlag::Help => "--help",
            ConventionFlag::ShortHelp => "-h",
            ConventionFlag::Version => "--version",
            ConventionFlag::Json => "--json",
            ConventionFlag::Plain => "--plain",
            ConventionFlag::NoColor => "--no-color",
            ConventionFlag::NoColorEnv => "NO_COLOR",
            ConventionFlag::NoInput => "--no-input",
            ConventionFlag::DryRun => "--dry-run",
            ConventionFlag::Force => "--force",
            ConventionFlag::Quiet => "--quiet",
            ConventionFlag::Verbose => "--verbose",
            ConventionFlag::Debug => "--debug",
        }
    }

    /// Literal substring matched by containment, if any.
    fn literal(&self) -> Option<&'static str> {
        match self {
            ConventionFlag::ShortHelp => None,
            other => Some(other.token()),
        }
    }

    /// Short form matched on word boundaries, if any.
    fn short_form(&self) -> Option<&'static Regex> {
        match self {
            ConventionFlag::ShortHelp => Some(&*RE_SHORT_H),
            ConventionFlag::Quiet => Some(&*RE_SHORT_Q),
            ConventionFlag::Verbose => Some(&*RE_SHORT_V),
            ConventionFlag::Debug => Some(&*RE_SHORT_D),
            _ => None,
        }
    }

    fn is_mentioned_in(&self, text: &str) -> bool {
        self.literal().is_some_and(|lit| text.contains(lit))
            || self.short_form().is_some_and(|re| re.is_match(text))
    }
}

/// Presence of every [`ConventionFlag`] in one text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagMentions {
    present: [bool; FLAG_COUNT],
}

impl FlagMentions {
    pub fn is_mentioned(&self, flag: ConventionFlag) -> bool {
        self.present[flag as usize]
    }

    /// `(flag, present)` pairs in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (ConventionFlag, bool)> + '_ {
        ConventionFlag::ALL
            .iter()
            .map(move |flag| (*flag, self.is_mentioned(*flag)))
    }
}

/// Detect which conventional flags `text` mentions.
pub fn find_flag_mentions(text: &str) -> FlagMentions {
    let mut present = [false; FLAG_COUNT];
    for flag in ConventionFlag::ALL {
        present[flag as usize] = flag.is_mentioned_in(text);
    }
    FlagMentions { present }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_ansi_csi() {
        assert!(has_ansi("\x1b[31mred\x1b[0m"));
        assert!(has_ansi("\x1b[1;32;40m"));
        assert!(has_ansi("\x1b[2K"));
    }

    #[test]
    fn test_has_ansi_osc() {
        assert!(has_ansi("\x1b]0;title\x07"));
        assert!(has_ansi("\x1b]8;;https://example.com\x1b\\link"));
    }

    #[test]
    fn test_has_ansi_two_char_escapes() {
        assert!(has_ansi("\x1bM"));
        assert!(has_ansi("\x1b\\"));
        assert!(has_ansi("\x1b_"));
        assert!(has_ansi("\x1b^"));
    }

    #[test]
    fn test_has_ansi_plain_text() {
        assert!(!has_ansi(""));
        assert!(!has_ansi("Usage: foo [OPTIONS]\n  --help  Print help"));
        assert!(!has_ansi("[31m not an escape without ESC"));
    }

    #[test]
    fn test_has_ansi_lone_esc() {
        // ESC followed by a byte outside every class is not a sequence.
        assert!(!has_ansi("\x1ba"));
        assert!(!has_ansi("trailing \x1b"));
    }

    #[test]
    fn test_has_carriage_return() {
        assert!(has_carriage_return("loading\rdone"));
        assert!(has_carriage_return("line\r\n"));
        assert!(!has_carriage_return("plain\nlines\n"));
    }

    #[test]
    fn test_looks_like_help() {
        assert!(looks_like_help("Usage: foo [OPTIONS]"));
        assert!(looks_like_help("NAME\n  foo\nSYNOPSIS\n  foo [-x]"));
        assert!(looks_like_help("Available Commands:\n  run"));
        assert!(looks_like_help("foo 1.0\nusage foo"));
        assert!(!looks_like_help("random text"));
        assert!(!looks_like_help(""));
    }

    #[test]
    fn test_short_flag_boundaries() {
        let m = find_flag_mentions("run -v now");
        assert!(m.is_mentioned(ConventionFlag::Verbose));

        let m = find_flag_mentions("run -version");
        assert!(!m.is_mentioned(ConventionFlag::Verbose));

        let m = find_flag_mentions("-v");
        assert!(m.is_mentioned(ConventionFlag::Verbose));

        let m = find_flag_mentions("  -q, --quiet-ish");
        assert!(m.is_mentioned(ConventionFlag::Quiet));

        let m = find_flag_mentions("use x-d here");
        assert!(!m.is_mentioned(ConventionFlag::Debug));
    }

    #[test]
    fn test_short_help_requires_boundary() {
        assert!(find_flag_mentions("  -h, --help").is_mentioned(ConventionFlag::ShortHelp));
        assert!(!find_flag_mentions("--help").is_mentioned(ConventionFlag::ShortHelp));
        assert!(!find_flag_mentions("-hx").is_mentioned(ConventionFlag::ShortHelp));
    }

    #[test]
    fn test_long_flags_by_containment() {
        let help = "Options:\n  --version\n  --json\n  --no-color (or set NO_COLOR)\n  --dry-run\n";
        let m = find_flag_mentions(help);

        assert!(m.is_mentioned(ConventionFlag::Version));
        assert!(m.is_mentioned(ConventionFlag::Json));
        assert!(m.is_mentioned(ConventionFlag::NoColor));
        assert!(m.is_mentioned(ConventionFlag::NoColorEnv));
        assert!(m.is_mentioned(ConventionFlag::DryRun));
        assert!(!m.is_mentioned(ConventionFlag::Plain));
        assert!(!m.is_mentioned(ConventionFlag::NoInput));
        assert!(!m.is_mentioned(ConventionFlag::Force));
        assert!(!m.is_mentioned(ConventionFlag::Help));
    }

    #[test]
    fn test_long_flag_matches_inside_longer_token() {
        // Containment is intentional for long flags.
        let m = find_flag_mentions("--versionX");
        assert!(m.is_mentioned(ConventionFlag::Version));
    }

    #[test]
    fn test_flag_mentions_iter_catalog_order() {
        let m = find_flag_mentions("--help -h");
        let flags: Vec<_> = m.iter().collect();

        assert_eq!(flags.len(), ConventionFlag::ALL.len());
        assert_eq!(flags[0], (ConventionFlag::Help, true));
        assert_eq!(flags[1], (ConventionFlag::ShortHelp, true));
        assert_eq!(flags[2], (ConventionFlag::Version, false));
    }

    #[test]
    fn test_noisy_markers() {
        assert!(contains_noisy_marker(
            "Traceback (most recent call last):\n  File \"x.py\""
        ));
        assert!(contains_noisy_marker("panic: runtime error"));
        assert!(contains_noisy_marker(
            "thread 'main' panicked at src/main.rs:3:5"
        ));
        assert!(contains_noisy_marker("Stack trace:\n  at foo"));
        assert!(!contains_noisy_marker("error: unknown flag --xyz"));
    }
}
