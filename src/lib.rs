//! turnscope: effectiveness analytics for human/agent coding sessions.
//!
//! This crate ingests newline-delimited JSON logs of a conversation between a human
//! operator and a coding agent, rebuilds the conversation structure, labels the intent
//! of every turn, scores each session, and folds scored sessions into a per-user
//! skill profile.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use turnscope::pipeline::Pipeline;
//! use turnscope::profile::ProfileAggregator;
//! use turnscope::storage::MemoryStore;
//!
//! fn main() -> turnscope::Result<()> {
//!     let report = Pipeline::new().analyze_file("session.jsonl")?;
//!     for session in &report.sessions {
//!         println!("{}: {}/100", session.id, session.metrics.session_score);
//!     }
//!
//!     let aggregator = ProfileAggregator::new(MemoryStore::new());
//!     let profile = aggregator.aggregate_user_profile("alice", &report.sessions)?;
//!     println!("skill {:.0}", profile.skill_level.overall);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! Data flows upward through five stages:
//!
//! - [`parser`]: Line-by-line record decoding and grouping by session
//! - [`reconstruction`]: Parent/child thread rebuilding and tool extraction
//! - [`classify`]: Rule-based activity labels for every turn
//! - [`metrics`]: Prompt quality, counters and the composite session score
//! - [`profile`]: Cross-session strengths, weaknesses and skill level
//!
//! Supporting modules:
//!
//! - [`model`]: Records, sessions, metrics and profile types
//! - [`pipeline`]: Parallel batch analysis with per-session failure isolation
//! - [`storage`]: Storage trait with JSON-file and in-memory backends
//! - [`insight`]: Narrative insight trait and records
//! - [`cli`]: Command-line interface
//! - [`config`]: Configuration management
//! - [`error`]: Error types and handling

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod insight;
pub mod metrics;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod profile;
pub mod reconstruction;
pub mod storage;
pub mod util;

// Re-export commonly used types at the crate root
pub use error::{Result, TurnscopeError};
pub use model::{ActivityKind, LogRecord, Metrics, ProcessedTurn, Session, UserProfile};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::classify::ActivityClassifier;
    pub use crate::error::{Result, TurnscopeError};
    pub use crate::insight::{AnalysisDepth, InsightGenerator, SessionInsight};
    pub use crate::metrics::{LoopDetector, MetricsEngine};
    pub use crate::model::{ActivityKind, LogRecord, ProcessedTurn, Session, UserProfile};
    pub use crate::parser::RecordParser;
    pub use crate::pipeline::Pipeline;
    pub use crate::profile::ProfileAggregator;
    pub use crate::reconstruction::ThreadReconstructor;
    pub use crate::storage::{JsonFileStore, MemoryStore, Storage};
}
