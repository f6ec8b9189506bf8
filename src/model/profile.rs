//! Per-user profile types.
//!
//! A [`UserProfile`] is derived from the full history of a user's scored sessions and
//! replaced wholesale on every aggregation. The summary types at the bottom of this
//! module are pure re-derivations over a profile and are never persisted.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::activity::ActivityKind;
use super::tools::ToolCategory;

/// Strength categories, one per analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrengthCategory {
    /// Breadth and fit of tool usage.
    ToolMastery,
    /// Driving work to a result.
    ProblemSolving,
    /// Error handling, typing, tests, refactoring.
    CodeQuality,
    /// Systematic exploration and cross-cutting change.
    Architecture,
}

impl StrengthCategory {
    /// Get the display name.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::ToolMastery => "Tool mastery",
            Self::ProblemSolving => "Problem solving",
            Self::CodeQuality => "Code quality",
            Self::Architecture => "Architecture",
        }
    }
}

/// Proficiency level of a strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProficiencyLevel {
    /// Early stage.
    Beginner,
    /// Solid fundamentals.
    Intermediate,
    /// Consistently strong.
    Advanced,
    /// Exceptional.
    Expert,
}

/// Direction of a score series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    /// Recent scores clearly above earlier ones.
    Improving,
    /// No clear movement, or not enough data.
    #[default]
    Stable,
    /// Recent scores clearly below earlier ones.
    Declining,
}

/// Severity of a weakness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Worth knowing about.
    Minor,
    /// Noticeably costs time or quality.
    Moderate,
    /// Dominates the outcome.
    Significant,
}

impl Severity {
    /// Numeric weight: minor=1, moderate=2, significant=3.
    #[must_use]
    pub const fn value(&self) -> u8 {
        match self {
            Self::Minor => 1,
            Self::Moderate => 2,
            Self::Significant => 3,
        }
    }

    /// Nearest severity for an averaged weight.
    #[must_use]
    pub fn from_average(avg: f64) -> Self {
        if avg >= 2.5 {
            Self::Significant
        } else if avg >= 1.5 {
            Self::Moderate
        } else {
            Self::Minor
        }
    }
}

/// Areas a weakness can be detected in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaknessArea {
    /// Many turns for little progress.
    ExcessIteration,
    /// Under-specified prompts.
    SolutionQuality,
    /// Low throughput for the time spent.
    TimeEfficiency,
    /// Tool usage patterns that waste effort.
    ToolUsage,
    /// Repeated error-fixing cycles.
    DebuggingLoops,
    /// Code changes without accompanying tests.
    UntestedChanges,
}

impl WeaknessArea {
    /// Get the display name.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::ExcessIteration => "Excess iteration",
            Self::SolutionQuality => "Solution quality",
            Self::TimeEfficiency => "Time efficiency",
            Self::ToolUsage => "Tool usage",
            Self::DebuggingLoops => "Debugging loops",
            Self::UntestedChanges => "Untested changes",
        }
    }
}

/// Whether a tendency helps or hurts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    /// Helps outcomes.
    Positive,
    /// Neither helps nor hurts.
    Neutral,
    /// Hurts outcomes.
    Negative,
}

/// Recommendation priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Act now.
    High,
    /// Act soon.
    Medium,
    /// Nice to have.
    Low,
}

/// A ranked strength.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalStrength {
    /// Strength category.
    pub category: StrengthCategory,
    /// Confidence 0-100.
    pub confidence: f64,
    /// Proficiency level.
    pub proficiency: ProficiencyLevel,
    /// Sessions contributing evidence.
    pub session_count: usize,
    /// Mean analyzer score.
    pub average_score: f64,
    /// Mean complexity estimate (0-10).
    pub average_complexity: f64,
    /// Distinct advanced indicator tags.
    pub advanced_indicators: Vec<String>,
    /// Score direction.
    pub trend: Trend,
    /// Consistency 0-100.
    pub consistency: f64,
}

/// A ranked weakness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWeakness {
    /// Weakness area.
    pub area: WeaknessArea,
    /// Aggregated severity.
    pub severity: Severity,
    /// Sessions the weakness occurred in.
    pub frequency: usize,
    /// Share of all sessions, in percent.
    pub frequency_percent: f64,
    /// What was observed.
    pub description: String,
    /// Concrete advice for the area.
    pub recommendations: Vec<String>,
    /// Improvement potential 0-100.
    pub improvement_potential: f64,
    /// Ids of sessions where it occurred (at most three, most recent first).
    pub example_sessions: Vec<String>,
}

/// A recurring behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodingTendency {
    /// Short identifier.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Share of sessions showing it, in percent.
    pub frequency_percent: f64,
    /// Whether it helps or hurts.
    pub impact: Impact,
}

/// A frequently used tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolPreference {
    /// Tool name.
    pub tool: String,
    /// Total invocations.
    pub usage_count: usize,
    /// Sessions using it.
    pub session_count: usize,
    /// Share of all invocations, in percent.
    pub share_percent: f64,
    /// Tool category.
    pub category: ToolCategory,
}

/// A skill to grow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthArea {
    /// Skill name.
    pub skill: String,
    /// Estimated current level 0-100.
    pub current_level: f64,
    /// Target level 0-100.
    pub target_level: f64,
    /// Suggested actions.
    pub recommended_actions: Vec<String>,
    /// Rough timeline.
    pub timeline: String,
    /// Priority.
    pub priority: Priority,
}

/// Five-way skill breakdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillBreakdown {
    /// Driving work to a result.
    pub problem_solving: f64,
    /// Quality of produced code.
    pub code_quality: f64,
    /// Tool usage.
    pub tool_mastery: f64,
    /// Throughput.
    pub efficiency: f64,
    /// Communication with the agent.
    pub communication: f64,
}

impl SkillBreakdown {
    /// Mean of the five components.
    #[must_use]
    pub fn overall(&self) -> f64 {
        (self.problem_solving + self.code_quality + self.tool_mastery + self.efficiency + self.communication)
            / 5.0
    }
}

/// Overall skill level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillLevel {
    /// Mean of the breakdown.
    pub overall: f64,
    /// Component scores.
    pub breakdown: SkillBreakdown,
    /// Direction of recent session scores.
    pub trajectory: Trend,
}

/// Statistics over human prompts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptStats {
    /// Human prompts counted (noise excluded).
    pub total_prompts: usize,
    /// Mean words per prompt.
    pub average_words: f64,
    /// Mean prompts per session.
    pub prompts_per_session: f64,
    /// Estimated prompt tokens (1.3 per word).
    pub estimated_tokens: u64,
}

/// Per-user aggregate profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// User identifier.
    pub user_id: String,
    /// Sessions in the history.
    pub total_sessions: usize,
    /// Summed session duration in hours.
    pub total_hours: f64,
    /// Ranked strengths.
    pub strengths: Vec<TechnicalStrength>,
    /// Ranked weaknesses.
    pub weaknesses: Vec<UserWeakness>,
    /// Recurring behaviours.
    pub tendencies: Vec<CodingTendency>,
    /// Most used tools.
    pub tool_preferences: Vec<ToolPreference>,
    /// Skills to grow.
    pub growth_areas: Vec<GrowthArea>,
    /// Overall skill level.
    pub skill_level: SkillLevel,
    /// Prompt statistics.
    #[serde(default)]
    pub prompt_stats: PromptStats,
    /// Ids of every session in the history, oldest first.
    pub session_ids: Vec<String>,
    /// When the profile was first created.
    pub created_at: DateTime<Utc>,
    /// When the profile was last derived.
    pub updated_at: DateTime<Utc>,
}

/// Activity and score movement over the last week.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyProgress {
    /// Sessions in the last seven days.
    pub sessions_this_week: usize,
    /// Hours in the last seven days.
    pub hours_this_week: f64,
    /// Mean session score in the last seven days.
    pub average_score_this_week: f64,
    /// Mean session score in the seven days before that.
    pub average_score_last_week: f64,
    /// This week minus last week.
    pub score_change: f64,
    /// Human activity counts in the last seven days.
    pub activity_breakdown: IndexMap<ActivityKind, usize>,
}

/// A prioritized piece of advice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Priority.
    pub priority: Priority,
    /// Area the advice targets.
    pub area: String,
    /// The advice.
    pub message: String,
    /// Concrete actions.
    pub actions: Vec<String>,
}

/// Read-only overview of a user's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnalyticsSummary {
    /// User identifier.
    pub user_id: String,
    /// Sessions in the history.
    pub total_sessions: usize,
    /// Summed hours.
    pub total_hours: f64,
    /// Overall skill level.
    pub skill_level: SkillLevel,
    /// Up to three strengths.
    pub top_strengths: Vec<TechnicalStrength>,
    /// Up to three weaknesses.
    pub top_weaknesses: Vec<UserWeakness>,
    /// Last-week movement.
    pub weekly_progress: WeeklyProgress,
    /// Prioritized advice.
    pub recommendations: Vec<Recommendation>,
    /// When the profile was last derived.
    pub last_updated: DateTime<Utc>,
}
