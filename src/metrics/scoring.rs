//! Composite session scoring.
//!
//! `score = round(0.30 efficiency + 0.25 quality + 0.25 progression + 0.20 tool mastery)`

use std::collections::HashSet;

use crate::model::{
    is_multi_edit, is_read_like, is_write_like, ActivityKind, Metrics, ScoreBreakdown, Session,
    ToolCategory,
};
use crate::util::clamp_score;

/// Activity sequences that indicate a well-run session. A session matches when one of
/// them is a (not necessarily contiguous) subsequence of its human activity labels.
pub const GOOD_FLOWS: &[&[ActivityKind]] = &[
    &[
        ActivityKind::InitialQuestion,
        ActivityKind::CodeExploration,
        ActivityKind::Implementation,
    ],
    &[
        ActivityKind::InitialQuestion,
        ActivityKind::SolutionDesign,
        ActivityKind::Implementation,
        ActivityKind::Validation,
    ],
    &[
        ActivityKind::ErrorHandling,
        ActivityKind::Implementation,
        ActivityKind::Validation,
    ],
    &[
        ActivityKind::TaskManagement,
        ActivityKind::Implementation,
        ActivityKind::Completion,
    ],
];

/// Points lost per detected loop.
pub const LOOP_PENALTY: f64 = 15.0;

/// Check if `needle` is a subsequence of `haystack`.
#[must_use]
pub fn is_subsequence(needle: &[ActivityKind], haystack: &[ActivityKind]) -> bool {
    let mut remaining = needle.iter().peekable();
    for kind in haystack {
        if remaining.peek() == Some(&kind) {
            remaining.next();
        }
    }
    remaining.peek().is_none()
}

/// Check if the activity sequence contains a good flow.
#[must_use]
pub fn has_good_flow(activities: &[ActivityKind]) -> bool {
    GOOD_FLOWS.iter().any(|flow| is_subsequence(flow, activities))
}

/// Token throughput banded into tiers, adjusted for dialogue pace and balance.
#[must_use]
pub fn efficiency_score(session: &Session, metrics: &Metrics) -> f64 {
    if session.turns.is_empty() {
        return 0.0;
    }
    let minutes = session.effective_duration_minutes();
    let tokens_per_minute = metrics.total_tokens as f64 / minutes;

    let mut score: f64 = if tokens_per_minute < 50.0 {
        20.0
    } else if tokens_per_minute < 100.0 {
        40.0
    } else if tokens_per_minute < 300.0 {
        70.0
    } else if tokens_per_minute < 500.0 {
        85.0
    } else {
        95.0
    };

    let turns_per_minute = session.turns.len() as f64 / minutes;
    if turns_per_minute > 2.0 {
        score *= 0.8;
    }

    let human_share = metrics.human_turns as f64 / session.turns.len() as f64;
    if (0.30..=0.50).contains(&human_share) {
        score = (score * 1.1).min(100.0);
    }

    clamp_score(score)
}

/// Forward movement: loops cost points, productive and well-ordered work earns them.
#[must_use]
pub fn progression_score(session: &Session, loop_count: u32) -> f64 {
    if session.turns.is_empty() {
        return 0.0;
    }
    let activities = session.human_activities();

    let productive_ratio = if activities.is_empty() {
        0.0
    } else {
        activities.iter().filter(|a| a.is_productive()).count() as f64 / activities.len() as f64
    };

    let mut score = (100.0 - LOOP_PENALTY * f64::from(loop_count)) * (0.5 + 0.5 * productive_ratio);

    if has_good_flow(&activities) {
        score *= 1.1;
    }

    if !activities.is_empty() {
        let errors = activities.iter().filter(|a| **a == ActivityKind::ErrorHandling).count();
        if errors as f64 / activities.len() as f64 > 0.30 {
            score *= 0.8;
        }
    }

    clamp_score(score)
}

/// Check for read-then-write sequencing, or planning tools used while planning.
#[must_use]
pub fn has_appropriate_tool_usage(session: &Session) -> bool {
    let planned = session.turns.iter().any(|t| {
        t.activity == Some(ActivityKind::TaskManagement)
            && t.tools.iter().any(|tool| ToolCategory::of(tool) == ToolCategory::Plan)
    });
    if planned {
        return true;
    }

    let tool_turns: Vec<_> = session.turns.iter().filter(|t| !t.tools.is_empty()).collect();
    tool_turns.windows(2).any(|pair| {
        pair[0].tools.iter().any(|t| is_read_like(t))
            && pair[1].tools.iter().any(|t| is_write_like(t) || is_multi_edit(t))
    })
}

/// Breadth of tool usage, adjusted for fit and over-reliance.
#[must_use]
pub fn tool_mastery_score(session: &Session, metrics: &Metrics) -> f64 {
    if session.turns.is_empty() {
        return 0.0;
    }
    let distinct: HashSet<&str> = session
        .turns
        .iter()
        .flat_map(|t| t.tools.iter().map(String::as_str))
        .collect();

    let mut score: f64 = match distinct.len() {
        0 => 20.0,
        1 => 40.0,
        2..=3 => 70.0,
        _ => 85.0,
    };

    if has_appropriate_tool_usage(session) {
        score *= 1.15;
    }

    let invocations = metrics.tool_invocations();
    if invocations > 0 {
        let top = metrics.tool_usage.values().copied().max().unwrap_or(0);
        if top as f64 / invocations as f64 > 0.70 {
            score *= 0.85;
        }
    }

    clamp_score(score)
}

/// Four-way breakdown from a session and its counters.
#[must_use]
pub fn breakdown(session: &Session, metrics: &Metrics) -> ScoreBreakdown {
    if session.turns.is_empty() {
        return ScoreBreakdown::default();
    }
    ScoreBreakdown {
        efficiency: efficiency_score(session, metrics),
        quality: clamp_score(metrics.average_prompt_quality),
        progression: progression_score(session, metrics.loop_count),
        tool_mastery: tool_mastery_score(session, metrics),
    }
}

/// Weighted, rounded composite.
#[must_use]
pub fn composite(breakdown: &ScoreBreakdown) -> u8 {
    let weighted = 0.30 * breakdown.efficiency
        + 0.25 * breakdown.quality
        + 0.25 * breakdown.progression
        + 0.20 * breakdown.tool_mastery;
    clamp_score(weighted).round() as u8
}
