//! Pre-flight lookup of the target executable.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Locate `program` the way a shell would before the audit starts.
///
/// A name containing `/` is checked as a path. Anything else is looked up on
/// `PATH`, falling back to the literal name relative to the working directory.
pub fn resolve_program(program: &str) -> Option<PathBuf> {
    resolve_with_path(program, std::env::var_os("PATH").as_deref())
}

/// [`resolve_program`] against an explicit `PATH` value.
pub fn resolve_with_path(program: &str, path_var: Option<&OsStr>) -> Option<PathBuf> {
    if program.is_empty() {
        return None;
    }

    let literal = Path::new(program);
    if program.contains('/') {
        return is_executable_file(literal).then(|| literal.to_path_buf());
    }

    if let Some(path_var) = path_var {
        for dir in std::env::split_paths(path_var) {
            // An empty PATH entry means the working directory.
            let dir = if dir.as_os_str().is_empty() {
                PathBuf::from(".")
            } else {
                dir
            };
            let candidate = dir.join(program);
            if is_executable_file(&candidate) {
                debug!(program, resolved = %candidate.display(), "resolved on PATH");
                return Some(candidate);
            }
        }
    }

    is_executable_file(literal).then(|| literal.to_path_buf())
}

#[cfg(unix)]
fn is_executable_file(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable_file(path: &Path) -> bool {
    path.is_file()
}
