//! `shelf reconcile` and `shelf check`.
//!
//! Reads raw candidates as a JSON array (a file, or stdin when the path is
//! `-`), runs them through the pipeline and prints the survivors. Output
//! goes to stdout; the "nothing detected" notice goes to stderr so piped
//! JSON stays parseable.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::io::Read;
use std::path::Path;

use shelfscan_core::models::{Candidate, Confidence, Rejection, Stage};
use shelfscan_core::pipeline::{check_title, reconcile_values, ReconcileReport};

use crate::config::Config;

/// Output format shared by every subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

const NOTHING_DETECTED: &str =
    "No book titles detected. Try a clearer photo with visible spine text.";

/// Read the candidate array from `input` (`-` for stdin).
pub fn read_candidates(input: &str) -> Result<Vec<Value>> {
    let content = if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read candidates from stdin")?;
        buf
    } else {
        std::fs::read_to_string(Path::new(input))
            .with_context(|| format!("Failed to read candidates file: {}", input))?
    };

    parse_candidates(&content).with_context(|| format!("Invalid candidates in {}", input))
}

fn parse_candidates(content: &str) -> Result<Vec<Value>> {
    let value: Value = serde_json::from_str(content).context("not valid JSON")?;
    match value {
        Value::Array(items) => Ok(items),
        other => bail!("expected a JSON array, got {}", json_kind(&other)),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

pub fn run_reconcile(
    config: &Config,
    input: &str,
    format: OutputFormat,
    show_report: bool,
) -> Result<()> {
    let values = read_candidates(input)?;
    let report = reconcile_values(&values, &config.reconcile.options());
    print_report(&report, format, show_report)
}

/// Print a pipeline report in the requested format.
pub fn print_report(report: &ReconcileReport, format: OutputFormat, show_report: bool) -> Result<()> {
    if report.nothing_detected() {
        eprintln!("{}", NOTHING_DETECTED);
    }

    match format {
        OutputFormat::Json if show_report => {
            println!("{}", serde_json::to_string_pretty(report)?)
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report.candidates)?),
        OutputFormat::Text => print!("{}", render_text(report, show_report)),
    }
    Ok(())
}

/// Human-readable rendering: one line per title, then the optional report.
pub fn render_text(report: &ReconcileReport, show_report: bool) -> String {
    let mut out = String::new();
    for (i, c) in report.candidates.iter().enumerate() {
        out.push_str(&format!("{:>3}. {} [{}]", i + 1, c.title, c.confidence));
        if let Some(pos) = &c.position {
            out.push_str(&format!(" @ ({:.1}, {:.1})", pos.x, pos.y));
        }
        out.push('\n');
    }

    if !show_report {
        return out;
    }

    let counts = &report.counts;
    out.push_str(&format!(
        "\ninput {} → normalized {} → books {} → valid {} → unique {}\n",
        counts.input, counts.normalized, counts.after_non_book, counts.after_validity, counts.unique
    ));
    out.push_str(&format!(
        "confidence: {} high, {} medium, {} low\n",
        report.confidence.high, report.confidence.medium, report.confidence.low
    ));

    if !report.rejected.is_empty() {
        out.push_str(&format!("\nrejected ({}):\n", report.rejected.len()));
        for r in &report.rejected {
            out.push_str(&format!(
                "  - {} [{}] {}: {}\n",
                r.title,
                r.confidence,
                r.stage.as_str(),
                r.rejection
            ));
        }
    }
    out
}

/// Verdict for one title, as printed by `shelf check`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckVerdict {
    pub title: String,
    pub confidence: Confidence,
    pub kept: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<Rejection>,
}

/// Run the non-book and validity filters on a single title.
///
/// An unrecognized confidence tag falls back to medium, the same as in
/// the pipeline.
pub fn check(title: &str, confidence: Option<&str>) -> CheckVerdict {
    let confidence = confidence.and_then(Confidence::parse).unwrap_or_default();
    let candidate = Candidate::new(title.trim(), confidence);
    let verdict = check_title(&candidate);

    CheckVerdict {
        title: candidate.title,
        confidence,
        kept: verdict.is_none(),
        stage: verdict.as_ref().map(|(stage, _)| *stage),
        rejection: verdict.map(|(_, reason)| reason),
    }
}

pub fn run_check(title: &str, confidence: Option<&str>, format: OutputFormat) -> Result<()> {
    let verdict = check(title, confidence);
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&verdict)?),
        OutputFormat::Text => match (&verdict.stage, &verdict.rejection) {
            (Some(stage), Some(reason)) => println!(
                "rejected \"{}\" [{}] at {}: {}",
                verdict.title,
                verdict.confidence,
                stage.as_str(),
                reason
            ),
            _ => println!("kept \"{}\" [{}]", verdict.title, verdict.confidence),
        },
    }
    Ok(())
}
