//! In-memory storage.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::{page, Storage};
use crate::error::Result;
use crate::insight::SessionInsight;
use crate::model::{Session, UserProfile};

#[derive(Debug, Default)]
struct Tables {
    sessions: HashMap<String, Session>,
    profiles: HashMap<String, UserProfile>,
    insights: HashMap<String, SessionInsight>,
}

/// Storage backed by in-process maps. Contents are lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.inner.read().sessions.len()
    }
}

impl Storage for MemoryStore {
    fn save_session(&self, session: &Session) -> Result<()> {
        self.inner.write().sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    fn get_session(&self, id: &str) -> Result<Option<Session>> {
        Ok(self.inner.read().sessions.get(id).cloned())
    }

    fn list_sessions(&self, limit: Option<usize>, offset: Option<usize>) -> Result<Vec<Session>> {
        let sessions: Vec<Session> = self.inner.read().sessions.values().cloned().collect();
        Ok(page(sessions, limit, offset))
    }

    fn save_profile(&self, user_id: &str, profile: &UserProfile) -> Result<()> {
        self.inner.write().profiles.insert(user_id.to_string(), profile.clone());
        Ok(())
    }

    fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        Ok(self.inner.read().profiles.get(user_id).cloned())
    }

    fn save_insight(&self, insight: &SessionInsight) -> Result<()> {
        self.inner
            .write()
            .insights
            .insert(insight.session_id.clone(), insight.clone());
        Ok(())
    }

    fn get_insight(&self, session_id: &str) -> Result<Option<SessionInsight>> {
        Ok(self.inner.read().insights.get(session_id).cloned())
    }

    fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut tables = self.inner.write();
        let expired: Vec<String> = tables
            .sessions
            .values()
            .filter(|s| s.end_time < cutoff)
            .map(|s| s.id.clone())
            .collect();
        for id in &expired {
            tables.sessions.remove(id);
            tables.insights.remove(id);
        }
        Ok(expired.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::*;

    #[test]
    fn test_round_trip_and_delete() {
        let store = MemoryStore::new();
        store.save_session(&session_at("old", day(1))).unwrap();
        store.save_session(&session_at("new", day(10))).unwrap();

        assert_eq!(store.list_sessions(None, None).unwrap()[0].id, "new");
        assert_eq!(store.delete_before(day(5)).unwrap(), 1);
        assert!(store.get_session("old").unwrap().is_none());
        assert_eq!(store.session_count(), 1);
    }

    #[test]
    fn test_missing_profile_is_none() {
        assert!(MemoryStore::new().get_profile("nobody").unwrap().is_none());
    }
}
