//! Session reconstruction from log records.
//!
//! This module handles:
//! - Building the parent/child forest from `parentId` links
//! - Flattening threads into one chronological turn sequence
//! - Extracting tool names per turn
//! - Deriving the session summary, duration and time bounds

mod tools;
mod tree;

pub use tools::*;
pub use tree::*;

use tracing::{debug, instrument, warn};

use crate::error::{Result, TurnscopeError};
use crate::model::{LogRecord, ProcessedTurn, Session};
use crate::util::truncate_chars;

/// Summary used when a session has neither a summary record nor a human turn.
pub const UNTITLED_SESSION: &str = "Untitled session";

/// Characters of the first human turn kept as a fallback summary.
pub const SUMMARY_MAX_CHARS: usize = 100;

/// Rebuilds a [`Session`] from one session's records.
#[derive(Debug, Clone)]
pub struct ThreadReconstructor {
    summary_max_chars: usize,
}

impl ThreadReconstructor {
    /// Create a reconstructor with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            summary_max_chars: SUMMARY_MAX_CHARS,
        }
    }

    /// Reconstruct a session.
    ///
    /// Records may arrive in any order. Summary records contribute the session
    /// summary and the time bounds but never become turns.
    #[instrument(skip(self, records), fields(records = records.len()))]
    pub fn reconstruct(&self, records: &[LogRecord]) -> Result<Session> {
        let Some(first) = records.first() else {
            return Err(TurnscopeError::EmptySession {
                session_id: "<unknown>".to_string(),
            });
        };
        let session_id = first.session_id.clone();
        if records.iter().any(|r| r.session_id != session_id) {
            warn!(session_id = %session_id, "Records from several sessions passed to one reconstruction");
        }

        let forest = RecordForest::new(records);
        let threads = forest.threads();
        debug!(session_id = %session_id, threads = threads.len(), "Built record forest");

        let ordered: Vec<&LogRecord> = threads.iter().flatten().map(|&i| forest.record(i)).collect();

        let turns: Vec<ProcessedTurn> = ordered
            .iter()
            .filter(|r| !r.is_summary())
            .map(|r| to_turn(r))
            .collect();

        let summary = ordered
            .iter()
            .find(|r| r.is_summary())
            .map(|r| r.text())
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| self.fallback_summary(&turns));

        // `first` guarantees both bounds exist.
        let start_time = records.iter().map(|r| r.timestamp).min().unwrap_or(first.timestamp);
        let end_time = records.iter().map(|r| r.timestamp).max().unwrap_or(first.timestamp);
        let duration_minutes = (end_time - start_time).num_milliseconds() as f64 / 60_000.0;

        debug!(
            session_id = %session_id,
            turns = turns.len(),
            duration_minutes,
            "Reconstructed session"
        );

        Ok(Session {
            id: session_id,
            summary,
            duration_minutes,
            turns,
            metrics: Default::default(),
            start_time,
            end_time,
        })
    }

    fn fallback_summary(&self, turns: &[ProcessedTurn]) -> String {
        turns
            .iter()
            .find(|t| t.is_human())
            .map_or_else(
                || UNTITLED_SESSION.to_string(),
                |t| truncate_chars(&t.content, self.summary_max_chars),
            )
    }
}

impl Default for ThreadReconstructor {
    fn default() -> Self {
        Self::new()
    }
}

/// Reconstruct a session with default settings.
pub fn reconstruct(records: &[LogRecord]) -> Result<Session> {
    ThreadReconstructor::new().reconstruct(records)
}

fn to_turn(record: &LogRecord) -> ProcessedTurn {
    let content = record.text();
    let mut turn = ProcessedTurn::new(&record.id, record.turn.role, content, record.timestamp);
    if let Some(usage) = record.turn.usage {
        turn.input_tokens = usage.input_tokens;
        turn.output_tokens = usage.output_tokens;
    }
    turn.tools = extract_tools(record);
    turn.is_noise = is_noise_text(&turn.content);
    turn
}
