//! Overall skill level from the most recent sessions.

use std::collections::HashMap;

use super::trend::{mean, windowed_trend};
use crate::insight::SessionInsight;
use crate::model::{Session, SkillBreakdown, SkillLevel};
use crate::util::clamp_score;

/// Sessions averaged for the breakdown and compared for the trajectory.
pub const RECENT_SESSIONS: usize = 3;
/// Communication has no measurable signal yet.
pub const COMMUNICATION_BASELINE: f64 = 70.0;
const CODE_QUALITY_FACTOR: f64 = 0.9;
const TRAJECTORY_THRESHOLD: f64 = 0.05;

/// Problem solving, tool mastery and efficiency for one session.
///
/// Structured insight scores take precedence over the session's own breakdown.
fn session_components(session: &Session, insight: Option<&SessionInsight>) -> (f64, f64, f64) {
    let b = &session.metrics.score_breakdown;
    let scores = insight.map(|i| i.scores).unwrap_or_default();
    (
        scores.problem_solving.unwrap_or(b.progression),
        scores.tool_mastery.unwrap_or(b.tool_mastery),
        scores.efficiency.unwrap_or(b.efficiency),
    )
}

/// Derive the skill level from sessions ordered oldest first.
#[must_use]
pub fn skill_level(sessions: &[&Session], insights: &HashMap<String, SessionInsight>) -> SkillLevel {
    let recent = &sessions[sessions.len().saturating_sub(RECENT_SESSIONS)..];
    let components: Vec<(f64, f64, f64)> = recent
        .iter()
        .map(|s| session_components(s, insights.get(&s.id)))
        .collect();

    let problem_solving = clamp_score(mean(&components.iter().map(|c| c.0).collect::<Vec<_>>()));
    let breakdown = SkillBreakdown {
        problem_solving,
        code_quality: clamp_score(CODE_QUALITY_FACTOR * problem_solving),
        tool_mastery: clamp_score(mean(&components.iter().map(|c| c.1).collect::<Vec<_>>())),
        efficiency: clamp_score(mean(&components.iter().map(|c| c.2).collect::<Vec<_>>())),
        communication: COMMUNICATION_BASELINE,
    };

    let scores: Vec<f64> = sessions
        .iter()
        .map(|s| f64::from(s.metrics.session_score))
        .collect();

    SkillLevel {
        overall: breakdown.overall(),
        breakdown,
        trajectory: windowed_trend(&scores, RECENT_SESSIONS, TRAJECTORY_THRESHOLD),
    }
}
