//! Loop detection.
//!
//! A loop is a repeated failure cycle: the operator keeps reporting errors after
//! the agent has already attempted a fix. Detection is pluggable; the engine uses
//! [`NoLoopDetector`] unless another detector is supplied.

use crate::model::{ActivityKind, ProcessedTurn};

/// Counts repeated-failure cycles in an ordered turn sequence.
pub trait LoopDetector: Send + Sync + std::fmt::Debug {
    /// Number of loops in `turns`.
    fn detect_loops(&self, turns: &[ProcessedTurn]) -> u32;
}

/// Reports no loops.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLoopDetector;

impl LoopDetector for NoLoopDetector {
    fn detect_loops(&self, _turns: &[ProcessedTurn]) -> u32 {
        0
    }
}

/// Counts human error reports that follow an agent write after an earlier error report.
///
/// `error_handling -> (agent edits) -> error_handling` is one loop; a chain of three
/// error reports separated by edits is two.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorCycleDetector;

impl LoopDetector for ErrorCycleDetector {
    fn detect_loops(&self, turns: &[ProcessedTurn]) -> u32 {
        let mut loops = 0;
        let mut open_error = false;
        let mut edited_since = false;

        for turn in turns {
            if turn.is_human() {
                if turn.is_noise {
                    continue;
                }
                let is_error = turn.activity == Some(ActivityKind::ErrorHandling);
                if is_error && open_error && edited_since {
                    loops += 1;
                }
                if is_error {
                    open_error = true;
                    edited_since = false;
                } else {
                    open_error = false;
                }
            } else if turn.tools.iter().any(|t| crate::model::is_write_like(t)) {
                edited_since = true;
            }
        }
        loops
    }
}
