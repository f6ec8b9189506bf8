//! Batch analysis: parse, reconstruct, classify and score every session in a log.
//!
//! Sessions are independent once grouped, so they are processed in parallel on the
//! rayon pool. A failing session is reported in [`BatchReport::failures`] and never
//! aborts the batch; only input-level problems (I/O, size ceiling, strict-mode parse
//! errors) fail the whole call.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::classify::ActivityClassifier;
use crate::config::{Config, ParserConfig};
use crate::error::{Result, TurnscopeError};
use crate::insight::{AnalysisDepth, InsightGenerator, SessionInsight};
use crate::metrics::{LoopDetector, MetricsEngine};
use crate::model::{LogRecord, Session};
use crate::parser::{ParseStats, RecordParser};
use crate::reconstruction::ThreadReconstructor;

/// A session that could not be analyzed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFailure {
    /// Session identifier.
    pub session_id: String,
    /// Error message.
    pub error: String,
}

/// Result of analyzing one log.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    /// Scored sessions, in order of first appearance in the log.
    pub sessions: Vec<Session>,
    /// Insights for sessions, when a generator is configured.
    pub insights: Vec<SessionInsight>,
    /// Sessions that failed.
    pub failures: Vec<SessionFailure>,
    /// Parser statistics.
    pub stats: ParseStats,
}

impl BatchReport {
    /// Check if every session succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs the analysis stages with shared settings.
#[derive(Clone)]
pub struct Pipeline {
    parser: ParserConfig,
    reconstructor: ThreadReconstructor,
    classifier: ActivityClassifier,
    metrics: MetricsEngine,
    generator: Option<Arc<dyn InsightGenerator>>,
    depth: AnalysisDepth,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("parser", &self.parser)
            .field("classifier", &self.classifier)
            .field("metrics", &self.metrics)
            .field("generator", &self.generator.is_some())
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// Create a pipeline with default settings and no insight generator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parser: ParserConfig::default(),
            reconstructor: ThreadReconstructor::new(),
            classifier: ActivityClassifier::new(),
            metrics: MetricsEngine::new(),
            generator: None,
            depth: AnalysisDepth::default(),
        }
    }

    /// Create a pipeline from configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            parser: config.parser.clone(),
            classifier: ActivityClassifier::with_config(config.classifier.clone()),
            ..Self::new()
        }
    }

    /// Override strict parsing.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.parser.strict = strict;
        self
    }

    /// Use a different loop detector.
    #[must_use]
    pub fn with_loop_detector(mut self, detector: impl LoopDetector + 'static) -> Self {
        self.metrics = self.metrics.with_loop_detector(detector);
        self
    }

    /// Generate an insight for every successful session.
    #[must_use]
    pub fn with_insight_generator(mut self, generator: Arc<dyn InsightGenerator>, depth: AnalysisDepth) -> Self {
        self.generator = Some(generator);
        self.depth = depth;
        self
    }

    /// Analyze one session's records.
    pub fn analyze_session(&self, records: &[LogRecord]) -> Result<Session> {
        let mut session = self.reconstructor.reconstruct(records)?;
        self.classifier.classify_session(&mut session.turns);
        self.metrics.annotate(&mut session);
        Ok(session)
    }

    /// Analyze a log held in memory.
    #[instrument(skip(self, content), fields(bytes = content.len()))]
    pub fn analyze_str(&self, content: &str) -> Result<BatchReport> {
        let mut parser = RecordParser::from_config(&self.parser);
        let groups = parser.group_by_session(content)?;
        Ok(self.analyze_groups(groups, parser.stats().clone()))
    }

    /// Analyze a log file.
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn analyze_file(&self, path: impl AsRef<Path>) -> Result<BatchReport> {
        let mut parser = RecordParser::from_config(&self.parser);
        let groups = parser.group_file(path)?;
        Ok(self.analyze_groups(groups, parser.stats().clone()))
    }

    /// Analyze grouped records, one session per group.
    pub fn analyze_groups(&self, groups: IndexMap<String, Vec<LogRecord>>, stats: ParseStats) -> BatchReport {
        let groups: Vec<(String, Vec<LogRecord>)> = groups.into_iter().collect();

        let outcomes: Vec<(String, Result<Session>)> = groups
            .par_iter()
            .map(|(id, records)| (id.clone(), self.analyze_session(records)))
            .collect();

        let mut report = BatchReport {
            stats,
            ..BatchReport::default()
        };
        for (session_id, outcome) in outcomes {
            match outcome {
                Ok(session) => report.sessions.push(session),
                Err(e) => {
                    if e.is_recoverable() {
                        warn!(session_id = %session_id, error = %e, "Session analysis failed");
                    } else {
                        error!(session_id = %session_id, error = %e, "Session analysis failed");
                    }
                    report.failures.push(SessionFailure {
                        session_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        if let Some(generator) = &self.generator {
            self.generate_insights(generator.as_ref(), &mut report);
        }

        info!(
            sessions = report.sessions.len(),
            failures = report.failures.len(),
            "Batch analyzed"
        );
        report
    }

    fn generate_insights(&self, generator: &dyn InsightGenerator, report: &mut BatchReport) {
        let outcomes: Vec<(String, Result<SessionInsight>)> = report
            .sessions
            .par_iter()
            .map(|s| (s.id.clone(), generator.generate(s, self.depth)))
            .collect();

        for (session_id, outcome) in outcomes {
            match outcome {
                Ok(insight) => report.insights.push(insight),
                Err(e) => {
                    let e = match e {
                        e @ TurnscopeError::InsightError { .. } => e,
                        other => TurnscopeError::InsightError {
                            session_id: session_id.clone(),
                            message: other.to_string(),
                        },
                    };
                    warn!(session_id = %session_id, error = %e, "Insight generation failed");
                    report.failures.push(SessionFailure {
                        session_id,
                        error: e.to_string(),
                    });
                }
            }
        }
        debug!(insights = report.insights.len(), "Insights generated");
    }
}
