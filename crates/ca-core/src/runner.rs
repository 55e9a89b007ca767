//! Subprocess runner with timeout, output cap, and guaranteed cleanup.
//!
//! Every probe invocation goes through [`ProcessRunner::run`], which provides:
//!
//! - Inherited environment plus per-invocation overrides (never mutates our own)
//! - stdin bound to /dev/null so prompts see EOF instead of blocking
//! - Independent capture of stdout and stderr, capped per stream
//! - Per-invocation timeout with SIGTERM → SIGKILL escalation on the process group
//! - A scoped [`ChildGuard`] that reaps the child on every exit path
//!
//! The runner is total: spawn failures, timeouts and malformed output all come
//! back as a [`RunResult`], never as an error.
//!
//! # Example
//!
//! ```ignore
//! use ca_core::runner::{Invocation, ProcessRunner};
//! use std::time::Duration;
//!
//! let runner = ProcessRunner::with_defaults();
//! let invocation = Invocation::new("mytool", vec!["--help".to_string()])
//!     .with_env("NO_COLOR", "1");
//! let result = runner.run(&invocation, Duration::from_secs(10));
//! println!("exit: {:?}, timed out: {}", result.exit_code, result.timed_out);
//! ```

use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Read};
use std::process::{Child, ChildStderr, ChildStdout, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, trace, warn};

/// Default maximum captured bytes per stream (10MB).
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Default grace period between SIGTERM and SIGKILL in milliseconds.
pub const DEFAULT_TERM_GRACE_MS: u64 = 500;

/// Default sleep between polls when no output is pending, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;

/// Synthetic stderr for an executable that could not be found.
pub const NOT_FOUND_MESSAGE: &str = "Command not found.";

const CHUNK_SIZE: usize = 8192;

/// A single command line to execute: program, arguments, env overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    env: BTreeMap<String, String>,
}

impl Invocation {
    /// Create an invocation. The program is mandatory, so argv is never empty.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            env: BTreeMap::new(),
        }
    }

    /// Build from a full argv (`[program, args...]`). Returns `None` if empty.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }

    /// Append one argument.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add an environment override for this child only.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Full argv, program first.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }
}

/// Which of the three mutually exclusive outcomes a run ended in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The process exited on its own (signal deaths map to 128 + signo).
    Exited(i32),
    /// The timeout elapsed and the process was terminated.
    TimedOut,
    /// The process never started.
    FailedToStart,
}

/// Captured result of one invocation.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    /// Argv that was executed.
    pub argv: Vec<String>,

    /// Standard output, lossy UTF-8 (may be truncated).
    pub stdout: String,

    /// Standard error, lossy UTF-8 (may be truncated).
    pub stderr: String,

    /// Exit code. Absent when timed out or failed to start.
    pub exit_code: Option<i32>,

    /// Whether the timeout elapsed.
    pub timed_out: bool,

    /// Whether either stream hit the output cap.
    pub truncated: bool,

    /// Wall-clock duration, including termination.
    #[serde(skip)]
    pub duration: Duration,
}

impl RunResult {
    fn failed_to_start(argv: Vec<String>, message: String, duration: Duration) -> Self {
        Self {
            argv,
            stdout: String::new(),
            stderr: message,
            exit_code: None,
            timed_out: false,
            truncated: false,
            duration,
        }
    }

    pub fn outcome(&self) -> RunOutcome {
        if self.timed_out {
            return RunOutcome::TimedOut;
        }
        match self.exit_code {
            Some(code) => RunOutcome::Exited(code),
            None => RunOutcome::FailedToStart,
        }
    }

    /// Check if the command exited with code 0.
    pub fn success(&self) -> bool {
        self.outcome() == RunOutcome::Exited(0)
    }

    /// stdout and stderr joined by a newline.
    pub fn combined(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }

    /// True if either stream has non-whitespace content.
    pub fn has_output(&self) -> bool {
        !self.stdout.trim().is_empty() || !self.stderr.trim().is_empty()
    }
}

/// Tunables for the runner.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Maximum captured bytes per stream.
    pub max_output_bytes: usize,

    /// Wait between SIGTERM and SIGKILL.
    pub term_grace: Duration,

    /// Sleep between polls when nothing was read.
    pub poll_interval: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            term_grace: Duration::from_millis(DEFAULT_TERM_GRACE_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

/// Executes invocations one at a time. Holds no state between runs.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    config: RunnerConfig,
}

impl ProcessRunner {
    /// Create a runner with the given configuration.
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Create a runner with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(RunnerConfig::default())
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run one invocation to completion or timeout.
    #[instrument(skip(self, invocation), fields(program = %invocation.program()))]
    pub fn run(&self, invocation: &Invocation, timeout: Duration) -> RunResult {
        let argv = invocation.argv();
        let start = Instant::now();

        debug!(
            argv = ?argv,
            env = ?invocation.env(),
            timeout_ms = timeout.as_millis() as u64,
            "spawning"
        );

        let mut command = Command::new(invocation.program());
        command
            .args(invocation.args())
            .envs(invocation.env())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Own process group, so a timeout can take down grandchildren too.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(program = %invocation.program(), error = %e, "failed to spawn");
                let message = spawn_failure_message(invocation.program(), &e);
                return RunResult::failed_to_start(argv, message, start.elapsed());
            }
        };

        let mut guard = ChildGuard::new(child);
        let captured = self.capture(&mut guard, timeout);
        drop(guard);

        let duration = start.elapsed();

        match captured {
            Ok(capture) => {
                if capture.truncated {
                    warn!(
                        limit = self.config.max_output_bytes,
                        "output exceeded cap, truncated"
                    );
                }
                let exit_code = capture.status.map(exit_code_of);
                info!(
                    duration_ms = duration.as_millis() as u64,
                    exit_code = ?exit_code,
                    timed_out = capture.timed_out,
                    "invocation complete"
                );
                RunResult {
                    argv,
                    stdout: String::from_utf8_lossy(&capture.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&capture.stderr).into_owned(),
                    exit_code,
                    timed_out: capture.timed_out,
                    truncated: capture.truncated,
                    duration,
                }
            }
            Err(e) => {
                error!(error = %e, "failed to wait for child");
                let message = format!("Failed to wait for {}: {}", invocation.program(), e);
                RunResult::failed_to_start(argv, message, duration)
            }
        }
    }

    /// Poll the child's pipes until it exits or the deadline passes.
    fn capture(&self, guard: &mut ChildGuard, timeout: Duration) -> io::Result<Capture> {
        // A timeout too large to represent as an Instant means no deadline.
        let deadline = Instant::now().checked_add(timeout);
        let limit = self.config.max_output_bytes;

        let mut stdout = guard.child.stdout.take();
        let mut stderr = guard.child.stderr.take();
        let mut out_buf = StreamBuf::new(limit);
        let mut err_buf = StreamBuf::new(limit);
        let mut chunk = vec![0u8; CHUNK_SIZE];

        loop {
            let now = Instant::now();
            if deadline.is_some_and(|deadline| now >= deadline) {
                warn!(
                    pid = guard.pid(),
                    timeout_ms = timeout.as_millis() as u64,
                    "timed out, terminating process group"
                );
                guard.terminate(self.config.term_grace, self.config.poll_interval);
                drain(&mut stdout, &mut stderr, &mut out_buf, &mut err_buf, &mut chunk);
                return Ok(Capture::finish(out_buf, err_buf, None, true));
            }

            let mut did_read = false;
            if let Some(ref mut out) = stdout {
                did_read |= out_buf.read_available(out, &mut chunk);
            }
            if let Some(ref mut err) = stderr {
                did_read |= err_buf.read_available(err, &mut chunk);
            }

            match guard.try_wait()? {
                Some(status) => {
                    drain(&mut stdout, &mut stderr, &mut out_buf, &mut err_buf, &mut chunk);
                    trace!(status = ?status, "process exited");
                    return Ok(Capture::finish(out_buf, err_buf, Some(status), false));
                }
                None => {
                    if !did_read {
                        // Avoid busy-waiting, but never sleep past the deadline.
                        let pause = match deadline {
                            Some(deadline) => self
                                .config
                                .poll_interval
                                .min(deadline.saturating_duration_since(now)),
                            None => self.config.poll_interval,
                        };
                        thread::sleep(pause);
                    }
                }
            }
        }
    }
}

struct Capture {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    status: Option<ExitStatus>,
    timed_out: bool,
    truncated: bool,
}

impl Capture {
    fn finish(
        out: StreamBuf,
        err: StreamBuf,
        status: Option<ExitStatus>,
        timed_out: bool,
    ) -> Self {
        Self {
            truncated: out.truncated || err.truncated,
            stdout: out.buf,
            stderr: err.buf,
            status,
            timed_out,
        }
    }
}

/// Byte buffer that stops growing at a fixed limit.
struct StreamBuf {
    buf: Vec<u8>,
    limit: usize,
    truncated: bool,
}

impl StreamBuf {
    fn new(limit: usize) -> Self {
        Self {
            buf: Vec::with_capacity(limit.min(65536)),
            limit,
            truncated: false,
        }
    }

    fn push(&mut self, data: &[u8]) {
        let space = self.limit.saturating_sub(self.buf.len());
        if data.len() > space {
            self.truncated = true;
        }
        self.buf.extend_from_slice(&data[..data.len().min(space)]);
    }

    /// Read whatever is immediately available. Returns true if bytes arrived.
    #[cfg(unix)]
    fn read_available<R: Read + std::os::unix::io::AsRawFd>(
        &mut self,
        stream: &mut R,
        chunk: &mut [u8],
    ) -> bool {
        match try_read_nonblocking(stream, chunk) {
            Ok(n) if n > 0 => {
                self.push(&chunk[..n]);
                true
            }
            _ => false,
        }
    }

    #[cfg(not(unix))]
    fn read_available<R: Read>(&mut self, stream: &mut R, chunk: &mut [u8]) -> bool {
        match try_read_nonblocking(stream, chunk) {
            Ok(n) if n > 0 => {
                self.push(&chunk[..n]);
                true
            }
            _ => false,
        }
    }
}

/// Pull what is left in both pipes after the child is gone.
///
/// Reads are non-blocking, so a grandchild that still holds a pipe open cannot
/// stall the audit. Stops at the output cap.
fn drain(
    stdout: &mut Option<ChildStdout>,
    stderr: &mut Option<ChildStderr>,
    out_buf: &mut StreamBuf,
    err_buf: &mut StreamBuf,
    chunk: &mut [u8],
) {
    if let Some(ref mut out) = stdout {
        while !out_buf.truncated && out_buf.read_available(out, chunk) {}
    }
    if let Some(ref mut err) = stderr {
        while !err_buf.truncated && err_buf.read_available(err, chunk) {}
    }
}

/// Owns a spawned child until it has been reaped.
///
/// Dropping the guard SIGKILLs whatever remains of the child's process group
/// and waits for the child if nobody has yet, so no exit path leaves a zombie
/// or an orphan behind.
struct ChildGuard {
    child: Child,
    pid: u32,
    reaped: bool,
}

impl ChildGuard {
    fn new(child: Child) -> Self {
        let pid = child.id();
        trace!(pid, "child spawned");
        Self {
            child,
            pid,
            reaped: false,
        }
    }

    fn pid(&self) -> u32 {
        self.pid
    }

    fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        let status = self.child.try_wait()?;
        if status.is_some() {
            self.reaped = true;
        }
        Ok(status)
    }

    fn wait(&mut self) {
        match self.child.wait() {
            Ok(_) => self.reaped = true,
            Err(e) => error!(pid = self.pid, error = %e, "failed to reap child"),
        }
    }

    /// SIGTERM the group, then SIGKILL if the child outlives the grace period.
    fn terminate(&mut self, grace: Duration, poll: Duration) {
        self.send_term();
        debug!(pid = self.pid, "sent SIGTERM");

        let deadline = Instant::now().checked_add(grace);
        while deadline.map_or(true, |deadline| Instant::now() < deadline) {
            match self.try_wait() {
                Ok(Some(_)) => {
                    trace!(pid = self.pid, "process exited after SIGTERM");
                    return;
                }
                Ok(None) => thread::sleep(poll),
                Err(e) => {
                    error!(pid = self.pid, error = %e, "failed to check process status");
                    break;
                }
            }
        }

        warn!(pid = self.pid, "process did not exit after SIGTERM, sending SIGKILL");
        self.send_kill();
        self.wait();
    }

    #[cfg(unix)]
    fn send_term(&mut self) {
        signal_group(self.pid, libc::SIGTERM);
    }

    #[cfg(unix)]
    fn send_kill(&mut self) {
        signal_group(self.pid, libc::SIGKILL);
    }

    #[cfg(not(unix))]
    fn send_term(&mut self) {
        let _ = self.child.kill();
    }

    #[cfg(not(unix))]
    fn send_kill(&mut self) {
        let _ = self.child.kill();
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        // Backgrounded grandchildren die with the probe.
        self.send_kill();
        if !self.reaped {
            self.wait();
        }
    }
}

/// Send a signal to the process group led by `pid`.
#[cfg(unix)]
fn signal_group(pid: u32, signal: libc::c_int) {
    // Negative PID targets the process group.
    let rc = unsafe { libc::kill(-(pid as libc::pid_t), signal) };
    if rc != 0 {
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            debug!(pid, signal, error = %err, "failed to signal process group");
        }
    }
}

/// Map an exit status to a code, using 128 + signo for signal deaths.
fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

fn spawn_failure_message(program: &str, err: &io::Error) -> String {
    match err.kind() {
        io::ErrorKind::NotFound => NOT_FOUND_MESSAGE.to_string(),
        _ => format!("Failed to start {}: {}", program, err),
    }
}

/// Try to read from a stream without blocking.
///
/// On Unix, this uses fcntl to set O_NONBLOCK on the file descriptor,
/// performs a read, then restores the original flags.
/// Returns Ok(0) if no data is available (EAGAIN/EWOULDBLOCK) or at EOF.
#[cfg(unix)]
fn try_read_nonblocking<R: Read + std::os::unix::io::AsRawFd>(
    stream: &mut R,
    buf: &mut [u8],
) -> io::Result<usize> {
    let fd = stream.as_raw_fd();

    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }

    let was_nonblocking = (flags & libc::O_NONBLOCK) != 0;
    if !was_nonblocking {
        let result = unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) };
        if result < 0 {
            return Err(io::Error::last_os_error());
        }
    }

    let result = stream.read(buf);

    if !was_nonblocking {
        unsafe {
            libc::fcntl(fd, libc::F_SETFL, flags);
        }
    }

    match result {
        Ok(n) => Ok(n),
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(0),
        Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(0),
        Err(e) => Err(e),
    }
}

/// Non-blocking read fallback for non-Unix platforms.
/// Falls back to blocking read.
#[cfg(not(unix))]
fn try_read_nonblocking<R: Read>(stream: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    stream.read(buf)
}
