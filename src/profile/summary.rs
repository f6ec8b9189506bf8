//! Weekly progress and recommendations.
//!
//! Both are pure functions of a stored profile and the user's sessions, so a summary
//! can be re-derived at any time without touching storage.

use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;

use super::trend::mean;
use crate::model::{
    ActivityKind, Priority, Recommendation, Session, Severity, Trend, UserAnalyticsSummary, UserProfile,
    WeeklyProgress,
};

const TOP_ITEMS: usize = 3;

/// Activity over the last window compared with the window before it.
#[must_use]
pub fn weekly_progress(sessions: &[&Session], now: DateTime<Utc>, window_days: u32) -> WeeklyProgress {
    let window = Duration::days(i64::from(window_days.max(1)));
    let this_start = now - window;
    let last_start = this_start - window;

    let this_week: Vec<&Session> = sessions
        .iter()
        .copied()
        .filter(|s| s.start_time > this_start && s.start_time <= now)
        .collect();
    let last_week: Vec<&Session> = sessions
        .iter()
        .copied()
        .filter(|s| s.start_time > last_start && s.start_time <= this_start)
        .collect();

    let average = |window: &[&Session]| {
        mean(
            &window
                .iter()
                .map(|s| f64::from(s.metrics.session_score))
                .collect::<Vec<_>>(),
        )
    };
    let average_score_this_week = average(&this_week);
    let average_score_last_week = average(&last_week);

    let mut activity_breakdown = IndexMap::new();
    for kind in ActivityKind::ALL {
        let count: usize = this_week.iter().map(|s| s.metrics.activity_count(kind)).sum();
        if count > 0 {
            activity_breakdown.insert(kind, count);
        }
    }

    WeeklyProgress {
        sessions_this_week: this_week.len(),
        hours_this_week: this_week.iter().map(|s| s.duration_hours()).sum(),
        average_score_this_week,
        average_score_last_week,
        score_change: average_score_this_week - average_score_last_week,
        activity_breakdown,
    }
}

fn severity_priority(severity: Severity) -> Priority {
    match severity {
        Severity::Significant => Priority::High,
        Severity::Moderate => Priority::Medium,
        Severity::Minor => Priority::Low,
    }
}

/// Prioritized recommendations, highest priority first.
#[must_use]
pub fn recommendations(profile: &UserProfile, progress: &WeeklyProgress) -> Vec<Recommendation> {
    let mut recs: Vec<Recommendation> = profile
        .weaknesses
        .iter()
        .take(TOP_ITEMS)
        .map(|w| Recommendation {
            priority: severity_priority(w.severity),
            area: w.area.label().to_string(),
            message: w.description.clone(),
            actions: w.recommendations.clone(),
        })
        .collect();

    if profile.skill_level.trajectory == Trend::Declining {
        recs.push(Recommendation {
            priority: Priority::High,
            area: "Overall".to_string(),
            message: "Recent session scores are below the sessions before them".to_string(),
            actions: vec![
                "Review the lowest-scoring recent session".to_string(),
                "Return to smaller, well-specified requests".to_string(),
            ],
        });
    }

    for strength in profile.strengths.iter().filter(|s| s.trend == Trend::Declining) {
        recs.push(Recommendation {
            priority: Priority::Medium,
            area: strength.category.label().to_string(),
            message: format!("{} has slipped in recent sessions", strength.category.label()),
            actions: vec!["Compare a recent session with an earlier strong one".to_string()],
        });
    }

    if progress.sessions_this_week == 0 {
        recs.push(Recommendation {
            priority: Priority::Low,
            area: "Practice".to_string(),
            message: "No sessions in the current window".to_string(),
            actions: vec!["Schedule a short session to keep momentum".to_string()],
        });
    }

    recs.sort_by_key(|r| r.priority);
    recs
}

/// Assemble a summary from a profile and the user's sessions.
#[must_use]
pub fn build_summary(
    profile: &UserProfile,
    sessions: &[&Session],
    now: DateTime<Utc>,
    window_days: u32,
) -> UserAnalyticsSummary {
    let weekly_progress = weekly_progress(sessions, now, window_days);
    let recommendations = recommendations(profile, &weekly_progress);
    UserAnalyticsSummary {
        user_id: profile.user_id.clone(),
        total_sessions: profile.total_sessions,
        total_hours: profile.total_hours,
        skill_level: profile.skill_level,
        top_strengths: profile.strengths.iter().take(TOP_ITEMS).cloned().collect(),
        top_weaknesses: profile.weaknesses.iter().take(TOP_ITEMS).cloned().collect(),
        weekly_progress,
        recommendations,
        last_updated: profile.updated_at,
    }
}
