//! Prompt quality, session metrics and composite scoring.
//!
//! [`MetricsEngine`] turns a classified [`Session`] into [`Metrics`]. Nothing here
//! fails: a session with no turns yields all-zero metrics.

mod loops;
pub mod quality;
pub mod scoring;

pub use loops::*;
pub use quality::{prompt_scores, score_prompt, PromptScores};

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, instrument};

use crate::model::{Metrics, ScoreBreakdown, Session};

/// Computes metrics and scores for sessions.
#[derive(Debug, Clone)]
pub struct MetricsEngine {
    detector: Arc<dyn LoopDetector>,
}

impl MetricsEngine {
    /// Create an engine that reports no loops.
    #[must_use]
    pub fn new() -> Self {
        Self {
            detector: Arc::new(NoLoopDetector),
        }
    }

    /// Use a different loop detector.
    #[must_use]
    pub fn with_loop_detector(mut self, detector: impl LoopDetector + 'static) -> Self {
        self.detector = Arc::new(detector);
        self
    }

    /// Counters without scores.
    #[must_use]
    pub fn counters(&self, session: &Session) -> Metrics {
        let mut metrics = Metrics::default();
        let mut quality_sum = 0.0;

        for turn in &session.turns {
            metrics.total_tokens = metrics.total_tokens.saturating_add(turn.total_tokens());
            for tool in &turn.tools {
                *metrics.tool_usage.entry(tool.clone()).or_insert(0) += 1;
            }
            if turn.is_human() {
                metrics.human_turns += 1;
                quality_sum += f64::from(turn.prompt_quality.unwrap_or_else(|| score_prompt(turn)));
                if let Some(activity) = turn.activity {
                    *metrics.activity_distribution.entry(activity).or_insert(0) += 1;
                }
            } else {
                metrics.agent_turns += 1;
            }
        }

        if metrics.human_turns > 0 {
            metrics.average_prompt_quality = quality_sum / metrics.human_turns as f64;
        }
        metrics.loop_count = self.detector.detect_loops(&session.turns);
        metrics
    }

    /// Counters, breakdown and composite score.
    #[instrument(skip(self, session), fields(session_id = %session.id))]
    pub fn compute_metrics(&self, session: &Session) -> Metrics {
        let mut metrics = self.counters(session);
        metrics.score_breakdown = scoring::breakdown(session, &metrics);
        metrics.session_score = scoring::composite(&metrics.score_breakdown);
        debug!(
            score = metrics.session_score,
            tokens = metrics.total_tokens,
            loops = metrics.loop_count,
            "Computed session metrics"
        );
        metrics
    }

    /// Four-way score breakdown.
    #[must_use]
    pub fn score_breakdown(&self, session: &Session) -> ScoreBreakdown {
        scoring::breakdown(session, &self.counters(session))
    }

    /// Composite 0-100 score.
    #[must_use]
    pub fn score_session(&self, session: &Session) -> u8 {
        scoring::composite(&self.score_breakdown(session))
    }

    /// Fill prompt quality on human turns and attach metrics.
    ///
    /// Existing prompt quality scores are kept.
    pub fn annotate(&self, session: &mut Session) {
        for turn in session.turns.iter_mut().filter(|t| t.is_human()) {
            let score = score_prompt(turn);
            turn.set_prompt_quality(score);
        }
        session.metrics = self.compute_metrics(session);
    }
}

impl Default for MetricsEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute metrics with the default engine.
#[must_use]
pub fn compute_metrics(session: &Session) -> Metrics {
    MetricsEngine::new().compute_metrics(session)
}

/// Composite score with the default engine.
#[must_use]
pub fn score_session(session: &Session) -> u8 {
    MetricsEngine::new().score_session(session)
}

/// Score breakdown with the default engine.
#[must_use]
pub fn score_breakdown(session: &Session) -> ScoreBreakdown {
    MetricsEngine::new().score_breakdown(session)
}

/// Tool histogram over several sessions, most used first.
#[must_use]
pub fn merged_tool_usage<'a>(sessions: impl IntoIterator<Item = &'a Session>) -> IndexMap<String, usize> {
    let mut merged: IndexMap<String, usize> = IndexMap::new();
    for session in sessions {
        for (tool, count) in &session.metrics.tool_usage {
            *merged.entry(tool.clone()).or_insert(0) += count;
        }
    }
    merged.sort_by(|ka, a, kb, b| b.cmp(a).then_with(|| ka.cmp(kb)));
    merged
}
