//! Narrative insights attached to sessions.
//!
//! An [`InsightGenerator`] turns a scored session into a [`SessionInsight`]. The
//! analysis text is opaque to the rest of the crate; only the optional structured
//! scores feed back into profile derivation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TurnscopeError};
use crate::model::{ActivityKind, Session};

/// How much effort the generator should spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisDepth {
    /// One-paragraph overview.
    Quick,
    /// Overview plus highlights.
    #[default]
    Standard,
    /// Full walkthrough.
    Deep,
}

impl AnalysisDepth {
    /// Get the wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Quick => "quick",
            Self::Standard => "standard",
            Self::Deep => "deep",
        }
    }
}

impl fmt::Display for AnalysisDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisDepth {
    type Err = TurnscopeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "quick" => Ok(Self::Quick),
            "standard" => Ok(Self::Standard),
            "deep" => Ok(Self::Deep),
            other => Err(TurnscopeError::InvalidArgument {
                name: "depth".to_string(),
                reason: format!("expected quick, standard or deep, got '{other}'"),
            }),
        }
    }
}

/// Structured scores a generator may report, each 0-100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightScores {
    /// Problem-solving effectiveness.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem_solving: Option<f64>,
    /// Quality of produced code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_quality: Option<f64>,
    /// Tool usage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_mastery: Option<f64>,
    /// Throughput.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub efficiency: Option<f64>,
}

/// Generator output for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInsight {
    /// Session the insight describes.
    pub session_id: String,
    /// Free-form narrative.
    pub analysis_text: String,
    /// Depth it was generated at.
    pub depth: AnalysisDepth,
    /// Optional structured scores.
    #[serde(default)]
    pub scores: InsightScores,
    /// When it was generated.
    pub generated_at: DateTime<Utc>,
}

/// Produces insights for sessions.
pub trait InsightGenerator: Send + Sync {
    /// Generate an insight. A failure is reported against that session only.
    fn generate(&self, session: &Session, depth: AnalysisDepth) -> Result<SessionInsight>;
}

/// Deterministic generator that narrates a session's metrics.
///
/// Reports no structured scores, so profile derivation falls back to the session's
/// own score breakdown.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsNarrator;

impl InsightGenerator for MetricsNarrator {
    fn generate(&self, session: &Session, depth: AnalysisDepth) -> Result<SessionInsight> {
        let m = &session.metrics;
        let mut text = format!(
            "Session \"{}\" ran {:.0} minutes over {} turns ({} human, {} agent) and scored {}/100.",
            session.summary,
            session.duration_minutes,
            session.turns.len(),
            m.human_turns,
            m.agent_turns,
            m.session_score
        );

        if depth != AnalysisDepth::Quick {
            let b = &m.score_breakdown;
            text.push_str(&format!(
                " Efficiency {:.0}, prompt quality {:.0}, progression {:.0}, tool mastery {:.0}.",
                b.efficiency, b.quality, b.progression, b.tool_mastery
            ));
            if let Some((kind, count)) = dominant_activity(session) {
                text.push_str(&format!(" Most human turns were {kind} ({count})."));
            }
        }

        if depth == AnalysisDepth::Deep {
            let tools: Vec<String> = m
                .tool_usage
                .iter()
                .map(|(tool, count)| format!("{tool} x{count}"))
                .collect();
            if !tools.is_empty() {
                text.push_str(&format!(" Tools: {}.", tools.join(", ")));
            }
            if m.loop_count > 0 {
                text.push_str(&format!(" {} repeated-failure loop(s) detected.", m.loop_count));
            }
        }

        Ok(SessionInsight {
            session_id: session.id.clone(),
            analysis_text: text,
            depth,
            scores: InsightScores::default(),
            generated_at: Utc::now(),
        })
    }
}

fn dominant_activity(session: &Session) -> Option<(ActivityKind, usize)> {
    session
        .metrics
        .activity_distribution
        .iter()
        .max_by_key(|(_, count)| **count)
        .map(|(kind, count)| (*kind, *count))
}
