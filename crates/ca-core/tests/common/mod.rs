//! Shared fixtures for cli-audit integration tests.
//!
//! Targets are small POSIX shell scripts written into a temp directory and run
//! as `sh <script>`, so no freshly written file is ever exec'd directly.

#![allow(dead_code)]

use ca_core::Invocation;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Help on stdout, exit 0; unknown flags rejected on stderr with a hint.
pub const WELL_BEHAVED: &str = r#"
case "$1" in
  --help|-h)
    echo "Usage: tool [OPTIONS]"
    echo ""
    echo "Options:"
    echo "  -h, --help  Print help"
    exit 0
    ;;
  *)
    echo "error: unexpected argument '$1'" >&2
    echo "For more information, try '--help'." >&2
    exit 2
    ;;
esac
"#;

/// Like [`WELL_BEHAVED`] but documents every conventional flag.
pub const FULLY_CONVENTIONAL: &str = r#"
case "$1" in
  --help|-h)
    echo "Usage: tool [OPTIONS]"
    echo ""
    echo "Options:"
    echo "  -h, --help      Print help"
    echo "      --version   Print version"
    echo "      --json      Machine-readable output"
    echo "      --plain     Stable plain output"
    echo "      --no-color  Disable color (also honors NO_COLOR)"
    echo "      --no-input  Never prompt"
    exit 0
    ;;
  *)
    echo "error: unexpected argument '$1' (see --help)" >&2
    exit 2
    ;;
esac
"#;

/// Accepts everything.
pub const ALWAYS_ZERO: &str = r#"
echo "Usage: tool"
exit 0
"#;

/// Hangs on `--help`, appending its pid to `$PIDFILE` first.
pub const HANGS_ON_HELP: &str = r#"
case "$1" in
  --help)
    echo $$ >> "$PIDFILE"
    exec sleep 30
    ;;
  -h)
    echo "Usage: tool"
    exit 0
    ;;
  *)
    echo "unknown flag, see --help" >&2
    exit 2
    ;;
esac
"#;

/// Bold help unless NO_COLOR is set; ignores TERM.
pub const ANSI_HONORS_NO_COLOR: &str = r#"
case "$1" in
  --help|-h)
    if [ -n "$NO_COLOR" ]; then
      echo "Usage: tool"
    else
      printf '\033[1mUsage:\033[0m tool\n'
    fi
    exit 0
    ;;
  *)
    echo "unknown flag, see --help" >&2
    exit 2
    ;;
esac
"#;

/// Bold help unless TERM=dumb; ignores NO_COLOR.
pub const ANSI_HONORS_DUMB_TERM: &str = r#"
case "$1" in
  --help|-h)
    if [ "$TERM" = "dumb" ]; then
      echo "Usage: tool"
    else
      printf '\033[1mUsage:\033[0m tool\n'
    fi
    exit 0
    ;;
  *)
    echo "unknown flag, see --help" >&2
    exit 2
    ;;
esac
"#;

/// Bold help no matter what.
pub const ANSI_ALWAYS: &str = r#"
case "$1" in
  --help|-h)
    printf '\033[1mUsage:\033[0m tool\n'
    exit 0
    ;;
  *)
    echo "unknown flag, see --help" >&2
    exit 2
    ;;
esac
"#;

/// Python-style crash on unknown flags.
pub const CRASHES_ON_BAD_FLAG: &str = r#"
case "$1" in
  --help|-h)
    echo "usage: tool [-h]"
    exit 0
    ;;
  *)
    echo "Traceback (most recent call last):" >&2
    echo '  File "tool.py", line 1, in <module>' >&2
    echo "ValueError: bad flag; try --help" >&2
    exit 1
    ;;
esac
"#;

/// Help only behind a `sub` subcommand prefix.
pub const SUBCOMMAND_ONLY: &str = r#"
if [ "$1" != "sub" ]; then
  echo "missing subcommand" >&2
  exit 64
fi
shift
case "$1" in
  --help|-h)
    echo "Usage: tool sub [OPTIONS]"
    exit 0
    ;;
  *)
    echo "unknown flag for sub, see --help" >&2
    exit 2
    ;;
esac
"#;

/// Temp directory holding target scripts.
pub struct Fixtures {
    dir: TempDir,
}

impl Fixtures {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `body` to `<dir>/<name>.sh` and return its path.
    pub fn script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join(format!("{}.sh", name));
        fs::write(&path, format!("#!/bin/sh\n{}", body)).expect("write script");
        path
    }

    /// `sh <script>` as a probe prefix.
    pub fn target(&self, name: &str, body: &str) -> Invocation {
        let script = self.script(name, body);
        Invocation::new("sh", vec![script.display().to_string()])
    }
}

/// Read every pid recorded in `path` (one per line).
pub fn read_pids(path: &Path) -> Vec<i32> {
    fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .filter_map(|line| line.trim().parse().ok())
        .collect()
}
