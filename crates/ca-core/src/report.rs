//! Render an [`AuditReport`] for humans or machines.

use crate::aggregate::Verdict;
use crate::probe::AuditReport;
use ca_common::{Finding, OutputFormat, Result};
use serde::Serialize;
use std::fmt::Write as _;

/// Render in the requested format. Output always ends with a newline.
pub fn render(report: &AuditReport, verdict: &Verdict, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(report, verdict)),
        OutputFormat::Json => render_json(report, verdict),
    }
}

/// Plain text report: transcripts, findings, summary line.
pub fn render_text(report: &AuditReport, verdict: &Verdict) -> String {
    let mut out = String::new();

    for transcript in &report.transcripts {
        // Writing to a String cannot fail.
        let _ = writeln!(out, "== PROBE: {} ==", transcript.label);
        let _ = writeln!(out, "--- stdout ---");
        let _ = writeln!(out, "{}", transcript.stdout.trim_end());
        let _ = writeln!(out, "--- stderr ---");
        let _ = writeln!(out, "{}", transcript.stderr.trim_end());
        out.push('\n');
    }

    for finding in &report.findings {
        write_finding(&mut out, finding);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Summary: {} FAIL, {} WARN", verdict.fail, verdict.warn);
    out
}

fn write_finding(out: &mut String, finding: &Finding) {
    let _ = writeln!(out, "[{}] {}", finding.severity, finding.title);
    if let Some(detail) = &finding.detail {
        for line in detail.lines() {
            let _ = writeln!(out, "  {}", line);
        }
    }
}

#[derive(Serialize)]
struct JsonSummary {
    fail: usize,
    warn: usize,
    exit_code: i32,
    exit_code_name: &'static str,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    report: &'a AuditReport,
    summary: JsonSummary,
}

/// Pretty-printed JSON document.
pub fn render_json(report: &AuditReport, verdict: &Verdict) -> Result<String> {
    let doc = JsonReport {
        report,
        summary: JsonSummary {
            fail: verdict.fail,
            warn: verdict.warn,
            exit_code: verdict.exit_code.as_i32(),
            exit_code_name: verdict.exit_code.code_name(),
        },
    };
    let mut out = serde_json::to_string_pretty(&doc)?;
    out.push('\n');
    Ok(out)
}
