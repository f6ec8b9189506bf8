//! Strength analyzers and their cross-session aggregation.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use super::trend::{mean, std_dev, trend};
use crate::metrics::scoring::{has_appropriate_tool_usage, has_good_flow};
use crate::model::{
    is_delegation, is_multi_edit, is_structural_overview, is_write_like, ActivityKind,
    ProficiencyLevel, Session, StrengthCategory, TechnicalStrength, ToolCategory,
};
use crate::util::clamp_score;

static ERROR_HANDLING_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:error handling|handle (?:the )?errors?|Result<|try|catch|unwrap|exceptions?|graceful(?:ly)?|fallback)\b")
        .unwrap()
});

static TYPING_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:types?|typed|typing|type hints?|generics?|interfaces?|annotations?|strict mode|type-safe|typesafe)\b")
        .unwrap()
});

static TEST_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:tests?|testing|unit tests?|integration tests?|coverage|assert(?:ion)?s?|spec)\b").unwrap()
});

static REFACTOR_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:refactor\w*|clean(?:ed|ing)? up|simplif\w*|extract(?:ed|ing)?|deduplicat\w*|restructur\w*)\b")
        .unwrap()
});

/// One analyzer's reading of one session.
#[derive(Debug, Clone, PartialEq)]
pub struct StrengthObservation {
    /// Strength category.
    pub category: StrengthCategory,
    /// Raw score 0-100.
    pub score: f64,
    /// Complexity estimate 0-10.
    pub complexity: f64,
    /// Advanced indicator tags.
    pub indicators: Vec<&'static str>,
}

type Analyzer = fn(&Session, f64) -> StrengthObservation;

/// The four strength analyzers.
pub const ANALYZERS: &[Analyzer] = &[
    analyze_tool_mastery,
    analyze_problem_solving,
    analyze_code_quality,
    analyze_architecture,
];

/// Complexity estimate for a session, 0-10.
///
/// Grows with human turns, distinct tools and wall-clock time.
#[must_use]
pub fn session_complexity(session: &Session) -> f64 {
    let distinct_tools: BTreeSet<&str> = session
        .turns
        .iter()
        .flat_map(|t| t.tools.iter().map(String::as_str))
        .collect();
    let raw = session.metrics.human_turns as f64 * 0.4
        + distinct_tools.len() as f64 * 0.75
        + session.duration_hours();
    raw.clamp(0.0, 10.0)
}

/// Run every analyzer over a session. Sessions without turns yield nothing.
#[must_use]
pub fn observe(session: &Session) -> Vec<StrengthObservation> {
    if session.turns.is_empty() {
        return Vec::new();
    }
    let complexity = session_complexity(session);
    ANALYZERS.iter().map(|analyze| analyze(session, complexity)).collect()
}

fn analyze_tool_mastery(session: &Session, complexity: f64) -> StrengthObservation {
    let m = &session.metrics;
    let mut indicators = Vec::new();

    if m.tool_count_where(is_multi_edit) >= 2 {
        indicators.push("multi_edit");
    }
    if m.tool_count_where(is_delegation) >= 2 {
        indicators.push("delegated_search");
    }
    if m.tool_count_where(|t| ToolCategory::of(t) == ToolCategory::Plan) > 0 {
        indicators.push("plan_tracking");
    }
    if m.tool_usage.len() >= 5 {
        indicators.push("broad_toolset");
    }
    if has_appropriate_tool_usage(session) {
        indicators.push("read_before_write");
    }

    StrengthObservation {
        category: StrengthCategory::ToolMastery,
        score: m.score_breakdown.tool_mastery,
        complexity,
        indicators,
    }
}

fn analyze_problem_solving(session: &Session, complexity: f64) -> StrengthObservation {
    let b = &session.metrics.score_breakdown;
    let activities = session.human_activities();
    let mut indicators = Vec::new();

    if has_good_flow(&activities) {
        indicators.push("good_flow");
    }
    if let Some(first_error) = activities.iter().position(|a| *a == ActivityKind::ErrorHandling) {
        if activities[first_error..]
            .iter()
            .any(|a| matches!(a, ActivityKind::Validation | ActivityKind::Completion))
        {
            indicators.push("error_recovery");
        }
    }
    let errors = activities.iter().filter(|a| **a == ActivityKind::ErrorHandling).count();
    if activities.len() >= 3 && (errors as f64) < activities.len() as f64 * 0.1 {
        indicators.push("low_error_rate");
    }
    let first_design = activities.iter().position(|a| *a == ActivityKind::SolutionDesign);
    let first_impl = activities.iter().position(|a| *a == ActivityKind::Implementation);
    if let (Some(design), Some(implementation)) = (first_design, first_impl) {
        if design < implementation {
            indicators.push("design_first");
        }
    }

    StrengthObservation {
        category: StrengthCategory::ProblemSolving,
        score: clamp_score(0.6 * b.progression + 0.4 * b.efficiency),
        complexity,
        indicators,
    }
}

fn analyze_code_quality(session: &Session, complexity: f64) -> StrengthObservation {
    let mut indicators = Vec::new();

    if any_turn_matches(session, &ERROR_HANDLING_TEXT) {
        indicators.push("error_handling");
    }
    if any_turn_matches(session, &TYPING_TEXT) {
        indicators.push("typing_discipline");
    }
    if any_turn_matches(session, &TEST_TEXT) {
        indicators.push("test_mentions");
    }
    if any_turn_matches(session, &REFACTOR_TEXT) {
        indicators.push("refactoring");
    }

    let score = 30.0 + 15.0 * indicators.len() as f64 + 0.2 * session.metrics.score_breakdown.quality;
    StrengthObservation {
        category: StrengthCategory::CodeQuality,
        score: clamp_score(score),
        complexity,
        indicators,
    }
}

fn any_turn_matches(session: &Session, re: &Regex) -> bool {
    session.turns.iter().any(|t| re.is_match(&t.content))
}

fn analyze_architecture(session: &Session, complexity: f64) -> StrengthObservation {
    let m = &session.metrics;
    let mut indicators = Vec::new();

    let first_write = session
        .turns
        .iter()
        .position(|t| t.tools.iter().any(|tool| is_write_like(tool)));
    let overview_before_write = session
        .turns
        .iter()
        .take(first_write.unwrap_or(session.turns.len()))
        .any(|t| t.tools.iter().any(|tool| is_structural_overview(tool)));
    if overview_before_write || m.activity_count(ActivityKind::CodeExploration) >= 3 {
        indicators.push("systematic_exploration");
    }

    let write_turns = session
        .turns
        .iter()
        .filter(|t| t.tools.iter().any(|tool| is_write_like(tool)))
        .count();
    if write_turns >= 3 || m.tool_count_where(is_multi_edit) > 0 {
        indicators.push("cross_cutting_changes");
    }
    if m.activity_count(ActivityKind::SolutionDesign) > 0 {
        indicators.push("design_discussion");
    }
    if m.activity_count(ActivityKind::TaskManagement) > 0
        || m.tool_count_where(|t| ToolCategory::of(t) == ToolCategory::Plan) > 0
    {
        indicators.push("planning");
    }

    let score = 35.0 + 15.0 * indicators.len() as f64 + 0.2 * m.score_breakdown.progression;
    StrengthObservation {
        category: StrengthCategory::Architecture,
        score: clamp_score(score),
        complexity,
        indicators,
    }
}

/// Proficiency from averaged score, complexity and distinct indicator count.
#[must_use]
pub fn proficiency(score: f64, complexity: f64, indicators: usize) -> ProficiencyLevel {
    if score >= 85.0 && complexity >= 7.0 && indicators >= 5 {
        ProficiencyLevel::Expert
    } else if score >= 70.0 && complexity >= 5.0 && indicators >= 3 {
        ProficiencyLevel::Advanced
    } else if score >= 50.0 && (complexity >= 4.0 || indicators >= 2) {
        ProficiencyLevel::Intermediate
    } else {
        ProficiencyLevel::Beginner
    }
}

/// Aggregate per-session observations, oldest first, into ranked strengths.
///
/// Strengths below `min_confidence` are dropped; the rest are sorted by confidence,
/// highest first.
#[must_use]
pub fn aggregate_strengths(
    per_session: &[Vec<StrengthObservation>],
    min_confidence: f64,
) -> Vec<TechnicalStrength> {
    let mut by_category: IndexMap<StrengthCategory, Vec<&StrengthObservation>> = IndexMap::new();
    for obs in per_session.iter().flatten() {
        by_category.entry(obs.category).or_default().push(obs);
    }

    let mut strengths: Vec<TechnicalStrength> = by_category
        .into_iter()
        .map(|(category, observations)| {
            let scores: Vec<f64> = observations.iter().map(|o| o.score).collect();
            let complexities: Vec<f64> = observations.iter().map(|o| o.complexity).collect();
            let indicators: BTreeSet<&str> = observations
                .iter()
                .flat_map(|o| o.indicators.iter().copied())
                .collect();

            let n = observations.len();
            let average_score = mean(&scores);
            let average_complexity = mean(&complexities);
            let confidence = clamp_score(
                average_score
                    + (3.0 * n as f64).min(20.0)
                    + 2.0 * average_complexity
                    + 5.0 * indicators.len() as f64,
            );

            TechnicalStrength {
                category,
                confidence,
                proficiency: proficiency(average_score, average_complexity, indicators.len()),
                session_count: n,
                average_score,
                average_complexity,
                advanced_indicators: indicators.into_iter().map(String::from).collect(),
                trend: trend(&scores, 3, 0.10),
                consistency: clamp_score(100.0 - 2.0 * std_dev(&scores)),
            }
        })
        .filter(|s| s.confidence >= min_confidence)
        .collect();

    strengths.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    strengths
}
