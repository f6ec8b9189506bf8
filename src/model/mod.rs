//! Data model for agent session logs and the analytics derived from them.
//!
//! - [`record`]: raw log records as they appear on each line
//! - [`content`]: plain-text and segmented turn content
//! - [`usage`]: per-turn token usage
//! - [`tools`]: tool taxonomy
//! - [`activity`]: the ten activity kinds
//! - [`session`]: reconstructed sessions, turns and metrics
//! - [`profile`]: per-user profiles and summaries

pub mod activity;
pub mod content;
pub mod profile;
pub mod record;
pub mod session;
pub mod tools;
pub mod usage;

pub use activity::*;
pub use content::*;
pub use profile::*;
pub use record::*;
pub use session::*;
pub use tools::*;
pub use usage::*;
