//! Durable storage for sessions, profiles and insights.
//!
//! The [`Storage`] trait is a plain key-value contract with no transactions across
//! calls. Two implementations ship with the crate:
//!
//! - [`JsonFileStore`]: one pretty-printed JSON file per object, written atomically
//! - [`MemoryStore`]: in-process maps behind a `parking_lot::RwLock`

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::error::Result;
use crate::insight::SessionInsight;
use crate::model::{Session, UserProfile};

/// Storage collaborator.
pub trait Storage: Send + Sync {
    /// Insert or replace a session.
    fn save_session(&self, session: &Session) -> Result<()>;

    /// Get a session by id.
    fn get_session(&self, id: &str) -> Result<Option<Session>>;

    /// List sessions, most recent start first.
    fn list_sessions(&self, limit: Option<usize>, offset: Option<usize>) -> Result<Vec<Session>>;

    /// Insert or replace a user's profile.
    fn save_profile(&self, user_id: &str, profile: &UserProfile) -> Result<()>;

    /// Get a user's profile.
    fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>>;

    /// Insert or replace a session's insight.
    fn save_insight(&self, insight: &SessionInsight) -> Result<()>;

    /// Get a session's insight.
    fn get_insight(&self, session_id: &str) -> Result<Option<SessionInsight>>;

    /// Delete sessions (and their insights) that ended before `cutoff`.
    ///
    /// Returns the number of sessions deleted.
    fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<usize>;

    /// Delete sessions that ended more than `days` days ago.
    fn delete_older_than(&self, days: u32) -> Result<usize> {
        self.delete_before(Utc::now() - Duration::days(i64::from(days)))
    }
}

impl<S: Storage + ?Sized> Storage for Arc<S> {
    fn save_session(&self, session: &Session) -> Result<()> {
        (**self).save_session(session)
    }

    fn get_session(&self, id: &str) -> Result<Option<Session>> {
        (**self).get_session(id)
    }

    fn list_sessions(&self, limit: Option<usize>, offset: Option<usize>) -> Result<Vec<Session>> {
        (**self).list_sessions(limit, offset)
    }

    fn save_profile(&self, user_id: &str, profile: &UserProfile) -> Result<()> {
        (**self).save_profile(user_id, profile)
    }

    fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        (**self).get_profile(user_id)
    }

    fn save_insight(&self, insight: &SessionInsight) -> Result<()> {
        (**self).save_insight(insight)
    }

    fn get_insight(&self, session_id: &str) -> Result<Option<SessionInsight>> {
        (**self).get_insight(session_id)
    }

    fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        (**self).delete_before(cutoff)
    }
}

/// Sort most recent first, then apply offset and limit.
pub(crate) fn page(mut sessions: Vec<Session>, limit: Option<usize>, offset: Option<usize>) -> Vec<Session> {
    sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time).then_with(|| a.id.cmp(&b.id)));
    sessions
        .into_iter()
        .skip(offset.unwrap_or(0))
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}
