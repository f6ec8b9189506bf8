//! Reconstructed sessions, their turns and metrics.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::activity::ActivityKind;
use super::record::Role;

/// A flattened, chronologically ordered turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedTurn {
    /// Source record id.
    pub id: String,
    /// Author role.
    pub role: Role,
    /// Flattened text content.
    pub content: String,
    /// When the turn was written.
    pub timestamp: DateTime<Utc>,
    /// Input tokens.
    #[serde(default)]
    pub input_tokens: u64,
    /// Output tokens.
    #[serde(default)]
    pub output_tokens: u64,
    /// Tool names invoked in this turn.
    #[serde(default)]
    pub tools: Vec<String>,
    /// Activity label (write-once).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<ActivityKind>,
    /// Prompt quality 0-100, human turns only (write-once).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_quality: Option<u8>,
    /// Harness-injected text (interrupt markers, system reminders).
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_noise: bool,
}

impl ProcessedTurn {
    /// Create a turn with no tokens, tools, label or score.
    #[must_use]
    pub fn new(id: impl Into<String>, role: Role, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            role,
            content: content.into(),
            timestamp,
            input_tokens: 0,
            output_tokens: 0,
            tools: Vec::new(),
            activity: None,
            prompt_quality: None,
            is_noise: false,
        }
    }

    /// Check if the human operator wrote this turn.
    #[must_use]
    pub fn is_human(&self) -> bool {
        self.role == Role::Human
    }

    /// Total tokens for this turn.
    #[must_use]
    pub const fn total_tokens(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }

    /// Set the activity label unless one is already present.
    ///
    /// Returns `true` if the label was written.
    pub fn set_activity(&mut self, activity: ActivityKind) -> bool {
        if self.activity.is_some() {
            return false;
        }
        self.activity = Some(activity);
        true
    }

    /// Set the prompt quality unless one is already present.
    ///
    /// Returns `true` if the score was written.
    pub fn set_prompt_quality(&mut self, score: u8) -> bool {
        if self.prompt_quality.is_some() {
            return false;
        }
        self.prompt_quality = Some(score.min(100));
        true
    }

    /// Minutes elapsed since another turn (negative if `other` is later).
    #[must_use]
    pub fn minutes_since(&self, other: &ProcessedTurn) -> f64 {
        (self.timestamp - other.timestamp).num_milliseconds() as f64 / 60_000.0
    }
}

/// Four-way session score breakdown. Every field lies in [0, 100].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    /// Token throughput and dialogue balance.
    pub efficiency: f64,
    /// Average prompt quality.
    pub quality: f64,
    /// Forward movement through the work.
    pub progression: f64,
    /// Breadth and appropriateness of tool usage.
    pub tool_mastery: f64,
}

/// Session-level counters and scores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// Input plus output tokens across all turns.
    pub total_tokens: u64,
    /// Number of human turns.
    pub human_turns: usize,
    /// Number of agent turns.
    pub agent_turns: usize,
    /// Tool name to invocation count.
    pub tool_usage: IndexMap<String, usize>,
    /// Mean prompt quality over human turns.
    pub average_prompt_quality: f64,
    /// Repeated-failure cycles.
    pub loop_count: u32,
    /// Activity label counts over human turns.
    pub activity_distribution: IndexMap<ActivityKind, usize>,
    /// Composite 0-100 score.
    pub session_score: u8,
    /// Sub-scores behind the composite.
    pub score_breakdown: ScoreBreakdown,
}

impl Metrics {
    /// Total tool invocations.
    #[must_use]
    pub fn tool_invocations(&self) -> usize {
        self.tool_usage.values().sum()
    }

    /// Invocation count for one tool.
    #[must_use]
    pub fn tool_count(&self, name: &str) -> usize {
        self.tool_usage.get(name).copied().unwrap_or(0)
    }

    /// Sum of invocation counts over tools matching a predicate.
    #[must_use]
    pub fn tool_count_where(&self, predicate: impl Fn(&str) -> bool) -> usize {
        self.tool_usage
            .iter()
            .filter(|(name, _)| predicate(name))
            .map(|(_, count)| count)
            .sum()
    }

    /// Number of human turns labeled with an activity.
    #[must_use]
    pub fn activity_count(&self, kind: ActivityKind) -> usize {
        self.activity_distribution.get(&kind).copied().unwrap_or(0)
    }
}

/// One reconstructed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Session identifier.
    pub id: String,
    /// Human-readable summary.
    pub summary: String,
    /// Wall-clock span in minutes.
    pub duration_minutes: f64,
    /// Ordered turns.
    pub turns: Vec<ProcessedTurn>,
    /// Metrics; all zero until computed.
    #[serde(default)]
    pub metrics: Metrics,
    /// First record timestamp.
    pub start_time: DateTime<Utc>,
    /// Last record timestamp.
    pub end_time: DateTime<Utc>,
}

impl Session {
    /// Duration for rate calculations; never below one minute.
    #[must_use]
    pub fn effective_duration_minutes(&self) -> f64 {
        self.duration_minutes.max(1.0)
    }

    /// Iterate over human turns.
    pub fn human_turns(&self) -> impl Iterator<Item = &ProcessedTurn> {
        self.turns.iter().filter(|t| t.is_human())
    }

    /// Activity labels of human turns, in order.
    #[must_use]
    pub fn human_activities(&self) -> Vec<ActivityKind> {
        self.human_turns().filter_map(|t| t.activity).collect()
    }

    /// Duration in hours.
    #[must_use]
    pub fn duration_hours(&self) -> f64 {
        self.duration_minutes.max(0.0) / 60.0
    }
}
