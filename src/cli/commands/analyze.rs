//! Analyze command implementation.
//!
//! Scores every session in a log file, and optionally saves the sessions and folds
//! them into a user's profile.

use std::sync::Arc;

use serde::Serialize;

use crate::cli::{AnalyzeArgs, Cli, OutputFormat};
use crate::config::Config;
use crate::error::Result;
use crate::insight::MetricsNarrator;
use crate::model::{Session, UserProfile};
use crate::pipeline::{BatchReport, Pipeline};
use crate::profile::ProfileAggregator;
use crate::storage::Storage;
use crate::util::truncate_chars;

use super::open_store;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeOutput<'a> {
    #[serde(flatten)]
    report: &'a BatchReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    profile: Option<&'a UserProfile>,
}

/// Run the analyze command.
pub fn run(cli: &Cli, config: &Config, args: &AnalyzeArgs) -> Result<()> {
    let mut pipeline = Pipeline::from_config(config);
    if args.lenient {
        pipeline = pipeline.with_strict(false);
    }
    if let Some(depth) = args.depth {
        pipeline = pipeline.with_insight_generator(Arc::new(MetricsNarrator), depth.into());
    }

    let report = pipeline.analyze_file(&args.file)?;

    let profile = if let Some(user) = &args.user {
        let store = open_store(cli, config)?;
        let aggregator = ProfileAggregator::with_config(store, config.profile.clone());
        Some(aggregator.aggregate_with_insights(user, &report.sessions, &report.insights)?)
    } else {
        if args.save {
            let store = open_store(cli, config)?;
            for session in &report.sessions {
                store.save_session(session)?;
            }
            for insight in &report.insights {
                store.save_insight(insight)?;
            }
        }
        None
    };

    match cli.effective_output() {
        OutputFormat::Json => {
            let output = AnalyzeOutput {
                report: &report,
                profile: profile.as_ref(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => print_text(cli, &report, profile.as_ref()),
    }

    Ok(())
}

fn print_text(cli: &Cli, report: &BatchReport, profile: Option<&UserProfile>) {
    if !cli.quiet {
        println!("Session Analysis");
        println!("================");
        println!();
    }

    for session in &report.sessions {
        print_session(session);
    }

    for insight in &report.insights {
        if !cli.quiet {
            println!("[{}] {}", insight.session_id, insight.analysis_text);
        }
    }

    if !report.failures.is_empty() {
        println!();
        println!("Failures:");
        for failure in &report.failures {
            println!("  {}: {}", failure.session_id, failure.error);
        }
    }

    if !report.stats.issues.is_empty() && !cli.quiet {
        println!();
        println!(
            "Skipped {} malformed line(s) ({:.1}% parsed)",
            report.stats.lines_skipped,
            report.stats.success_rate()
        );
    }

    if let Some(profile) = profile {
        println!();
        println!(
            "Profile '{}' updated: {} sessions, {:.1} hours, skill {:.0}",
            profile.user_id, profile.total_sessions, profile.total_hours, profile.skill_level.overall
        );
    }
}

fn print_session(session: &Session) {
    let m = &session.metrics;
    let b = &m.score_breakdown;
    println!(
        "{:<12} {:>3}/100  {:>4} turns  {:>6.1} min  {}",
        truncate_chars(&session.id, 12),
        m.session_score,
        session.turns.len(),
        session.duration_minutes,
        truncate_chars(&session.summary, 50)
    );
    println!(
        "             efficiency {:.0}  quality {:.0}  progression {:.0}  tools {:.0}",
        b.efficiency, b.quality, b.progression, b.tool_mastery
    );
}
