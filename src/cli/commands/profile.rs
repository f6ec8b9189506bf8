//! Profile command implementation.

use crate::cli::{Cli, OutputFormat, ProfileArgs};
use crate::config::Config;
use crate::error::{Result, TurnscopeError};
use crate::model::UserAnalyticsSummary;
use crate::profile::ProfileAggregator;
use crate::storage::Storage;

use super::open_store;

/// Run the profile command.
pub fn run(cli: &Cli, config: &Config, args: &ProfileArgs) -> Result<()> {
    let store = open_store(cli, config)?;

    if args.full {
        let profile = store
            .get_profile(&args.user)?
            .ok_or_else(|| not_found(&args.user))?;
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }

    let aggregator = ProfileAggregator::with_config(store, config.profile.clone());
    let summary = aggregator
        .summarize(&args.user)?
        .ok_or_else(|| not_found(&args.user))?;

    match cli.effective_output() {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => print_summary(&summary),
    }
    Ok(())
}

fn not_found(user: &str) -> TurnscopeError {
    TurnscopeError::InvalidArgument {
        name: "user".to_string(),
        reason: format!("no profile stored for '{user}'"),
    }
}

fn print_summary(summary: &UserAnalyticsSummary) {
    let skill = &summary.skill_level;
    println!("Profile: {}", summary.user_id);
    println!("{}", "=".repeat(9 + summary.user_id.len()));
    println!();
    println!("Sessions:      {}", summary.total_sessions);
    println!("Hours:         {:.1}", summary.total_hours);
    println!("Skill:         {:.0} ({:?})", skill.overall, skill.trajectory);
    println!(
        "  problem solving {:.0}, code quality {:.0}, tools {:.0}, efficiency {:.0}, communication {:.0}",
        skill.breakdown.problem_solving,
        skill.breakdown.code_quality,
        skill.breakdown.tool_mastery,
        skill.breakdown.efficiency,
        skill.breakdown.communication
    );

    if !summary.top_strengths.is_empty() {
        println!();
        println!("Strengths:");
        for s in &summary.top_strengths {
            println!(
                "  {:<16} {:>5.1}% confidence  {:?}",
                s.category.label(),
                s.confidence,
                s.proficiency
            );
        }
    }

    if !summary.top_weaknesses.is_empty() {
        println!();
        println!("Weaknesses:");
        for w in &summary.top_weaknesses {
            println!("  {:<16} {:?}  {}", w.area.label(), w.severity, w.description);
        }
    }

    let week = &summary.weekly_progress;
    println!();
    println!(
        "This week: {} sessions, {:.1} hours, average score {:.0} ({:+.0})",
        week.sessions_this_week, week.hours_this_week, week.average_score_this_week, week.score_change
    );

    if !summary.recommendations.is_empty() {
        println!();
        println!("Recommendations:");
        for rec in &summary.recommendations {
            println!("  [{:?}] {}: {}", rec.priority, rec.area, rec.message);
        }
    }
}
