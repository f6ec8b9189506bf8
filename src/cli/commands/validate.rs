//! Validate command implementation.
//!
//! Parses a log leniently and reports malformed lines plus structural warnings
//! (dangling parent references, disconnected threads) per session.

use serde::Serialize;

use crate::cli::{Cli, OutputFormat, ValidateArgs};
use crate::config::Config;
use crate::error::{Result, TurnscopeError};
use crate::model::LogRecord;
use crate::parser::{group_records, ParseIssue, RecordParser};
use crate::reconstruction::RecordForest;

/// Validation result for one session.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionCheck {
    session_id: String,
    records: usize,
    threads: usize,
    warnings: Vec<String>,
}

/// Complete validation report.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidationReport {
    lines_processed: usize,
    records_parsed: usize,
    success_rate: f64,
    issues: Vec<ParseIssue>,
    sessions: Vec<SessionCheck>,
}

/// Run the validate command.
pub fn run(cli: &Cli, config: &Config, args: &ValidateArgs) -> Result<()> {
    let mut parser = RecordParser::from_config(&config.parser).with_strict(false);
    let records = parser.parse_file(&args.file)?;
    let stats = parser.stats().clone();

    let sessions: Vec<SessionCheck> = group_records(records)
        .into_iter()
        .map(|(session_id, records)| check_session(session_id, &records))
        .collect();

    let report = ValidationReport {
        lines_processed: stats.lines_processed,
        records_parsed: stats.records_parsed,
        success_rate: stats.success_rate(),
        issues: stats.issues,
        sessions,
    };

    match cli.effective_output() {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_text(cli, args, &report),
    }

    match report.issues.first() {
        Some(first) => Err(TurnscopeError::parse(
            first.line,
            format!("{} malformed line(s); first: {}", report.issues.len(), first.message),
        )),
        None => Ok(()),
    }
}

fn check_session(session_id: String, records: &[LogRecord]) -> SessionCheck {
    let forest = RecordForest::new(records);
    let mut warnings = Vec::new();

    let dangling = (0..forest.len())
        .filter(|&i| forest.record(i).parent().is_some() && forest.parent_of(i).is_none())
        .count();
    if dangling > 0 {
        warnings.push(format!("{dangling} record(s) reference a missing parent"));
    }

    let threads = forest.threads().len();
    if threads > 1 {
        warnings.push(format!("{threads} disconnected threads"));
    }

    SessionCheck {
        session_id,
        records: records.len(),
        threads,
        warnings,
    }
}

fn print_text(cli: &Cli, args: &ValidateArgs, report: &ValidationReport) {
    println!("Validation Results");
    println!("==================");
    println!();
    println!("Lines:    {}", report.lines_processed);
    println!("Records:  {} ({:.1}%)", report.records_parsed, report.success_rate);
    println!("Sessions: {}", report.sessions.len());
    println!();

    for session in &report.sessions {
        let status = if session.warnings.is_empty() { "OK  " } else { "WARN" };
        println!(
            "{status} {} ({} records, {} thread(s))",
            session.session_id, session.records, session.threads
        );
        if !cli.quiet {
            for warning in &session.warnings {
                println!("    {warning}");
            }
        }
    }

    if !report.issues.is_empty() {
        println!();
        for issue in report.issues.iter().take(args.max_issues) {
            println!("    line {}: {}", issue.line, issue.message);
        }
        if report.issues.len() > args.max_issues {
            println!("    ... {} more", report.issues.len() - args.max_issues);
        }
    }

    println!();
    if report.issues.is_empty() {
        println!("All lines parsed successfully.");
    } else {
        println!("Validation completed with {} malformed line(s).", report.issues.len());
    }
}
