//! cli-audit: audit a command-line program against common CLI conventions.
//!
//! Usage: `cli-audit [OPTIONS] -- <command> [args...]`

use ca_common::{AuditConfig, Error, OutputFormat, DEFAULT_TIMEOUT_SECS};
use ca_core::exit_codes::ExitCode;
use ca_core::logging::{generate_run_id, init_logging, LogConfig, LogFormat, LogLevel};
use ca_core::resolve::resolve_program;
use ca_core::{report, Invocation, ProbeSuite, Verdict};
use clap::Parser;
use std::io::Write;
use tracing::{debug, info, info_span};

#[derive(Parser, Debug)]
#[command(name = "cli-audit")]
#[command(about = "Audit a CLI for help, error, and color conventions")]
#[command(version)]
struct Cli {
    /// Per-probe timeout in seconds
    #[arg(long, env = "CLI_AUDIT_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: f64,

    /// Treat WARN findings as failures
    #[arg(long, env = "CLI_AUDIT_STRICT")]
    strict: bool,

    /// Print raw stdout/stderr of the --help and invalid-flag probes
    #[arg(long)]
    print_output: bool,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,

    /// Log format on stderr (human or jsonl)
    #[arg(long, value_name = "FORMAT")]
    log_format: Option<LogFormat>,

    /// Command to audit, with any leading arguments (e.g. `git remote`)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    cmd: Vec<String>,
}

impl Cli {
    fn audit_config(&self) -> ca_common::Result<AuditConfig> {
        let config = AuditConfig::default()
            .with_timeout(AuditConfig::timeout_from_secs(self.timeout)?)
            .with_strict(self.strict)
            .with_print_output(self.print_output)
            .with_format(self.format);
        config.validate()?;
        Ok(config)
    }

    /// Target argv with a stray leading `--` removed.
    fn target(&self) -> &[String] {
        match self.cmd.split_first() {
            Some((first, rest)) if first == "--" => rest,
            _ => &self.cmd,
        }
    }
}

fn report_error(err: &Error) -> ExitCode {
    debug!(code = err.code(), error = %err, "audit aborted before probing");
    match (err, err.remediation()) {
        (Error::NoCommand, Some(usage)) => eprintln!("Error: no command provided.\n{}", usage),
        (other, Some(fix)) => eprintln!("Error: {}\n  Fix: {}", other, fix),
        (other, None) => eprintln!("Error: {}", other),
    }
    ExitCode::for_error(err)
}

fn run(cli: &Cli) -> Result<ExitCode, Error> {
    let config = cli.audit_config()?;
    let prefix = Invocation::from_argv(cli.target()).ok_or(Error::NoCommand)?;

    let resolved = resolve_program(prefix.program()).ok_or_else(|| Error::CommandNotFound {
        program: prefix.program().to_string(),
    })?;
    debug!(program = prefix.program(), resolved = %resolved.display(), "target resolved");

    // Found only relative to the working directory: exec would not search there.
    let prefix = if !prefix.program().contains('/') && resolved.as_os_str() == prefix.program() {
        Invocation::new(format!("./{}", prefix.program()), prefix.args().to_vec())
    } else {
        prefix
    };

    let report = ProbeSuite::new(prefix, config.timeout)
        .with_transcripts(config.print_output)
        .run();
    let verdict = Verdict::from_findings(&report.findings, config.strict);
    info!(
        fail = verdict.fail,
        warn = verdict.warn,
        exit_code = %verdict.exit_code,
        "audit complete"
    );

    let rendered = report::render(&report, &verdict, config.format)?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    stdout.flush()?;

    Ok(verdict.exit_code)
}

fn main() {
    let cli = Cli::parse();

    let log_config = LogConfig::from_env(
        LogLevel::from_verbosity(cli.verbose, cli.quiet),
        cli.log_format,
    );
    init_logging(&log_config);

    let run_id = generate_run_id();
    let span = info_span!("audit", run_id = %run_id);
    let exit_code = span.in_scope(|| match run(&cli) {
        Ok(code) => code,
        Err(err) => report_error(&err),
    });

    std::process::exit(exit_code.as_i32());
}
