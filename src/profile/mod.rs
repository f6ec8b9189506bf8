//! Cross-session profile aggregation.
//!
//! A [`UserProfile`] is never patched. Every call to
//! [`ProfileAggregator::aggregate_user_profile`] loads the user's full session history
//! from storage, re-derives every section with [`derive_profile`] and replaces the
//! stored profile with a single write. Calls for the same user are serialized by a
//! per-user lock; calls for different users run independently.
//!
//! # Example
//!
//! ```rust,no_run
//! use turnscope::profile::ProfileAggregator;
//! use turnscope::storage::MemoryStore;
//!
//! # fn main() -> turnscope::Result<()> {
//! let aggregator = ProfileAggregator::new(MemoryStore::new());
//! let profile = aggregator.aggregate_user_profile("alice", &[])?;
//! println!("{} sessions", profile.total_sessions);
//! # Ok(())
//! # }
//! ```

pub mod growth;
pub mod skill;
pub mod stats;
pub mod strengths;
pub mod summary;
pub mod trend;
pub mod weaknesses;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, instrument, warn};

use crate::config::ProfileConfig;
use crate::error::{Result, TurnscopeError};
use crate::insight::SessionInsight;
use crate::model::{Session, UserAnalyticsSummary, UserProfile};
use crate::storage::Storage;

/// Per-user mutual exclusion.
///
/// Locks are created on first use and dropped again once no caller holds or waits
/// on them, so the table only contains users with an aggregation in flight.
#[derive(Debug, Default)]
pub struct UserLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl UserLocks {
    /// Create an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `user_id`.
    pub fn with_lock<T>(&self, user_id: &str, f: impl FnOnce() -> T) -> T {
        let lock = self.lock_for(user_id);
        let result = {
            let _guard = lock.lock();
            f()
        };
        drop(lock);
        self.release(user_id);
        result
    }

    fn lock_for(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the entry when the table holds the only reference.
    fn release(&self, user_id: &str) {
        let mut locks = self.locks.lock();
        if locks.get(user_id).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(user_id);
        }
    }

    /// Number of users with a lock.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    /// Check if no user has a lock.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.lock().is_empty()
    }
}

/// Derives and persists user profiles through a storage collaborator.
#[derive(Debug)]
pub struct ProfileAggregator<S: Storage> {
    storage: S,
    locks: UserLocks,
    config: ProfileConfig,
}

impl<S: Storage> ProfileAggregator<S> {
    /// Create an aggregator with default settings.
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, ProfileConfig::default())
    }

    /// Create an aggregator with explicit settings.
    pub fn with_config(storage: S, config: ProfileConfig) -> Self {
        Self {
            storage,
            locks: UserLocks::new(),
            config,
        }
    }

    /// Underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Save new sessions for a user and re-derive their profile from the full history.
    pub fn aggregate_user_profile(&self, user_id: &str, new_sessions: &[Session]) -> Result<UserProfile> {
        self.aggregate_with_insights(user_id, new_sessions, &[])
    }

    /// Like [`aggregate_user_profile`](Self::aggregate_user_profile), also saving insights
    /// for the new sessions.
    ///
    /// The profile is derived from the stored history with `new_sessions` taking the
    /// place of stored copies. Nothing is written unless derivation succeeds.
    #[instrument(skip(self, new_sessions, new_insights), fields(new = new_sessions.len()))]
    pub fn aggregate_with_insights(
        &self,
        user_id: &str,
        new_sessions: &[Session],
        new_insights: &[SessionInsight],
    ) -> Result<UserProfile> {
        self.locks
            .with_lock(user_id, || self.aggregate_locked(user_id, new_sessions, new_insights))
    }

    fn aggregate_locked(
        &self,
        user_id: &str,
        new_sessions: &[Session],
        new_insights: &[SessionInsight],
    ) -> Result<UserProfile> {
        if let Some(unscored) = new_sessions.iter().find(|s| !has_metrics(s)) {
            return Err(unscored_error(user_id, unscored));
        }

        let existing = self.storage.get_profile(user_id)?;

        let mut session_ids = existing
            .as_ref()
            .map(|p| p.session_ids.clone())
            .unwrap_or_default();
        for session in new_sessions {
            if !session_ids.contains(&session.id) {
                session_ids.push(session.id.clone());
            }
        }

        let mut history = Vec::with_capacity(session_ids.len());
        for id in &session_ids {
            // Later duplicates in the batch win, matching save order.
            if let Some(fresh) = new_sessions.iter().rev().find(|s| &s.id == id) {
                history.push(fresh.clone());
                continue;
            }
            match self.storage.get_session(id)? {
                Some(session) => history.push(session),
                None => warn!(user_id, session_id = %id, "Session in profile history is missing from storage"),
            }
        }

        if history.is_empty() {
            return Err(TurnscopeError::aggregation(user_id, "no sessions in history"));
        }
        if let Some(unscored) = history.iter().find(|s| !has_metrics(s)) {
            return Err(unscored_error(user_id, unscored));
        }

        let mut insights = HashMap::new();
        for session in &history {
            if let Some(insight) = self.storage.get_insight(&session.id)? {
                insights.insert(session.id.clone(), insight);
            }
        }
        for insight in new_insights {
            insights.insert(insight.session_id.clone(), insight.clone());
        }

        let profile = derive_profile(
            user_id,
            &history,
            &insights,
            existing.as_ref(),
            &self.config,
            Utc::now(),
        );

        for session in new_sessions {
            self.storage.save_session(session)?;
        }
        for insight in new_insights {
            self.storage.save_insight(insight)?;
        }
        self.storage.save_profile(user_id, &profile)?;

        debug!(
            user_id,
            sessions = profile.total_sessions,
            strengths = profile.strengths.len(),
            weaknesses = profile.weaknesses.len(),
            "Profile derived"
        );
        Ok(profile)
    }

    /// Summarize a user's stored profile as of now.
    ///
    /// Returns `Ok(None)` when the user has no profile.
    pub fn summarize(&self, user_id: &str) -> Result<Option<UserAnalyticsSummary>> {
        self.summarize_at(user_id, Utc::now())
    }

    /// Summarize a user's stored profile as of `now`.
    pub fn summarize_at(&self, user_id: &str, now: DateTime<Utc>) -> Result<Option<UserAnalyticsSummary>> {
        let Some(profile) = self.storage.get_profile(user_id)? else {
            return Ok(None);
        };

        let mut sessions = Vec::with_capacity(profile.session_ids.len());
        for id in &profile.session_ids {
            if let Some(session) = self.storage.get_session(id)? {
                sessions.push(session);
            }
        }
        let refs: Vec<&Session> = sessions.iter().collect();

        Ok(Some(summary::build_summary(
            &profile,
            &refs,
            now,
            self.config.recent_window_days,
        )))
    }
}

/// Metrics were attached if the role counts cover every turn.
fn has_metrics(session: &Session) -> bool {
    session.metrics.human_turns + session.metrics.agent_turns == session.turns.len()
}

fn unscored_error(user_id: &str, session: &Session) -> TurnscopeError {
    TurnscopeError::aggregation(user_id, format!("session '{}' has no computed metrics", session.id))
}

/// Derive a profile from a user's scored sessions.
///
/// Sessions are ordered by start time before analysis. `previous` only contributes
/// its creation time.
#[must_use]
pub fn derive_profile(
    user_id: &str,
    sessions: &[Session],
    insights: &HashMap<String, SessionInsight>,
    previous: Option<&UserProfile>,
    config: &ProfileConfig,
    now: DateTime<Utc>,
) -> UserProfile {
    let mut ordered: Vec<&Session> = sessions.iter().collect();
    ordered.sort_by_key(|s| s.start_time);

    let strength_obs: Vec<_> = ordered.iter().map(|s| strengths::observe(s)).collect();
    let strengths = strengths::aggregate_strengths(&strength_obs, config.min_strength_confidence);

    let weakness_obs: Vec<_> = ordered
        .iter()
        .map(|s| (s.id.clone(), weaknesses::observe(s)))
        .collect();
    let weaknesses = weaknesses::aggregate_weaknesses(&weakness_obs);

    let growth_areas = growth::growth_areas(&weaknesses, &strengths);

    UserProfile {
        user_id: user_id.to_string(),
        total_sessions: ordered.len(),
        total_hours: ordered.iter().map(|s| s.duration_hours()).sum(),
        skill_level: skill::skill_level(&ordered, insights),
        tendencies: stats::tendencies(&ordered),
        tool_preferences: stats::tool_preferences(&ordered),
        prompt_stats: stats::prompt_stats(&ordered),
        strengths,
        weaknesses,
        growth_areas,
        session_ids: ordered.iter().map(|s| s.id.clone()).collect(),
        created_at: previous.map_or(now, |p| p.created_at),
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::classify::ActivityClassifier;
    use crate::insight::{AnalysisDepth, InsightScores};
    use crate::metrics::MetricsEngine;
    use crate::model::{ProcessedTurn, Role};
    use crate::storage::MemoryStore;

    fn scored_session(id: &str, day: u32, prompts: &[&str]) -> Session {
        let start = Utc.with_ymd_and_hms(2025, 3, day, 9, 0, 0).unwrap();
        let mut turns = Vec::new();
        for (i, prompt) in prompts.iter().enumerate() {
            let at = start + Duration::minutes(2 * i as i64);
            turns.push(ProcessedTurn::new(format!("{id}-h{i}"), Role::Human, *prompt, at));
            let mut reply = ProcessedTurn::new(format!("{id}-a{i}"), Role::Agent, "Done.", at + Duration::minutes(1));
            reply.tools = vec!["Read".to_string(), "Edit".to_string()];
            reply.input_tokens = 800;
            reply.output_tokens = 400;
            turns.push(reply);
        }
        let end = turns.last().map_or(start, |t| t.timestamp);
        let mut session = Session {
            id: id.to_string(),
            summary: prompts.first().copied().unwrap_or_default().to_string(),
            duration_minutes: (end - start).num_seconds() as f64 / 60.0,
            turns,
            metrics: Default::default(),
            start_time: start,
            end_time: end,
        };
        ActivityClassifier::new().classify_session(&mut session.turns);
        MetricsEngine::new().annotate(&mut session);
        session
    }

    fn sample() -> Vec<Session> {
        vec![
            scored_session("s1", 3, &["Implement a retry wrapper in src/net.rs", "Now add tests for it"]),
            scored_session("s2", 4, &["Fix the error in `parse_config`: it panics on empty input"]),
        ]
    }

    #[test]
    fn test_aggregate_persists_profile() {
        let aggregator = ProfileAggregator::new(MemoryStore::new());
        let profile = aggregator.aggregate_user_profile("alice", &sample()).unwrap();

        assert_eq!(profile.total_sessions, 2);
        assert_eq!(profile.session_ids, vec!["s1", "s2"]);
        assert_eq!(profile.skill_level.breakdown.communication, skill::COMMUNICATION_BASELINE);
        assert_eq!(aggregator.storage().get_profile("alice").unwrap(), Some(profile));
        assert_eq!(aggregator.storage().session_count(), 2);
    }

    #[test]
    fn test_reaggregation_extends_history() {
        let aggregator = ProfileAggregator::new(MemoryStore::new());
        let first = aggregator.aggregate_user_profile("bob", &sample()[..1]).unwrap();
        let second = aggregator.aggregate_user_profile("bob", &sample()[1..]).unwrap();

        assert_eq!(second.total_sessions, 2);
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);

        // Re-submitting a known session does not duplicate it.
        let third = aggregator.aggregate_user_profile("bob", &sample()[..1]).unwrap();
        assert_eq!(third.total_sessions, 2);
    }

    #[test]
    fn test_empty_history_fails_without_writing() {
        let aggregator = ProfileAggregator::new(MemoryStore::new());
        let err = aggregator.aggregate_user_profile("nobody", &[]).unwrap_err();

        assert!(matches!(err, TurnscopeError::AggregationError { .. }));
        assert!(aggregator.storage().get_profile("nobody").unwrap().is_none());
    }

    #[test]
    fn test_unscored_session_rejected() {
        let aggregator = ProfileAggregator::new(MemoryStore::new());
        let mut raw = sample().remove(0);
        raw.metrics = Default::default();

        let err = aggregator.aggregate_user_profile("carol", &[raw]).unwrap_err();
        assert!(matches!(err, TurnscopeError::AggregationError { .. }));
        assert!(aggregator.storage().get_profile("carol").unwrap().is_none());
        assert_eq!(aggregator.storage().session_count(), 0);
    }

    #[test]
    fn test_summarize_missing_profile_is_none() {
        let aggregator = ProfileAggregator::new(MemoryStore::new());
        assert!(aggregator.summarize("ghost").unwrap().is_none());
    }

    #[test]
    fn test_summarize_at_fixed_clock() {
        let aggregator = ProfileAggregator::new(MemoryStore::new());
        aggregator.aggregate_user_profile("dana", &sample()).unwrap();

        let now = Utc.with_ymd_and_hms(2025, 3, 5, 0, 0, 0).unwrap();
        let summary = aggregator.summarize_at("dana", now).unwrap().unwrap();
        assert_eq!(summary.user_id, "dana");
        assert_eq!(summary.weekly_progress.sessions_this_week, 2);
        assert!(summary.top_strengths.len() <= 3);
    }

    #[test]
    fn test_concurrent_aggregation_same_user() {
        let aggregator = Arc::new(ProfileAggregator::new(MemoryStore::new()));
        let handles: Vec<_> = (0..8u32)
            .map(|i| {
                let aggregator = Arc::clone(&aggregator);
                thread::spawn(move || {
                    let session = scored_session(&format!("t{i}"), 1 + i, &["Refactor the cache module"]);
                    aggregator.aggregate_user_profile("erin", &[session]).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let profile = aggregator.storage().get_profile("erin").unwrap().unwrap();
        assert_eq!(profile.total_sessions, 8);
        assert!(aggregator.locks.is_empty());
    }

    #[test]
    fn test_rejected_aggregation_leaves_storage_unchanged() {
        let aggregator = ProfileAggregator::new(MemoryStore::new());
        let before = aggregator.aggregate_user_profile("erin", &sample()).unwrap();
        let stored_s1 = aggregator.storage().get_session("s1").unwrap();

        let mut raw = sample().remove(0);
        raw.metrics = Default::default();
        let insight = SessionInsight {
            session_id: "s1".into(),
            analysis_text: "unscored".into(),
            depth: AnalysisDepth::Quick,
            scores: InsightScores::default(),
            generated_at: Utc::now(),
        };

        let err = aggregator
            .aggregate_with_insights("erin", &[raw], &[insight])
            .unwrap_err();
        assert!(matches!(err, TurnscopeError::AggregationError { .. }));

        assert_eq!(aggregator.storage().get_session("s1").unwrap(), stored_s1);
        assert!(stored_s1.is_some_and(|s| has_metrics(&s)));
        assert!(aggregator.storage().get_insight("s1").unwrap().is_none());
        assert_eq!(aggregator.storage().get_profile("erin").unwrap(), Some(before));

        let again = aggregator.aggregate_user_profile("erin", &[]).unwrap();
        assert_eq!(again.total_sessions, 2);
    }

    #[test]
    fn test_resubmitted_session_replaces_stored_copy() {
        let aggregator = ProfileAggregator::new(MemoryStore::new());
        aggregator.aggregate_user_profile("gina", &sample()).unwrap();

        let longer = scored_session("s1", 3, &["Implement a retry wrapper", "Add tests", "Add docs"]);
        let profile = aggregator.aggregate_user_profile("gina", &[longer]).unwrap();

        assert_eq!(profile.total_sessions, 2);
        assert_eq!(profile.prompt_stats.total_prompts, 4);
        let stored = aggregator.storage().get_session("s1").unwrap().unwrap();
        assert_eq!(stored.turns.len(), 6);
    }

    #[test]
    fn test_lock_entry_kept_while_waiting() {
        let locks = UserLocks::new();
        let waiter = locks.lock_for("hal");
        locks.with_lock("hal", || assert_eq!(locks.len(), 1));
        assert_eq!(locks.len(), 1);

        drop(waiter);
        locks.with_lock("hal", || ());
        assert!(locks.is_empty());
    }

    #[test]
    fn test_derive_orders_by_start_time() {
        let mut sessions = sample();
        sessions.reverse();
        let profile = derive_profile(
            "frank",
            &sessions,
            &HashMap::new(),
            None,
            &ProfileConfig::default(),
            Utc::now(),
        );
        assert_eq!(profile.session_ids, vec!["s1", "s2"]);
        assert!(profile.tool_preferences.iter().any(|p| p.tool == "Read"));
        assert_eq!(profile.prompt_stats.total_prompts, 3);
    }
}
