//! Weakness detectors and their cross-session aggregation.

use indexmap::IndexMap;

use crate::model::{
    is_delegation, is_file_creation, is_in_place_edit, is_manual_search, is_raw_read,
    is_structural_overview, is_write_like, ActivityKind, Session, Severity, ToolCategory,
    UserWeakness, WeaknessArea,
};
use crate::util::clamp_score;

/// Sessions an area must appear in to be kept, unless it is severe on average.
const MIN_FREQUENCY: usize = 2;
const MIN_AVERAGE_SEVERITY: f64 = 2.0;
const EXAMPLE_SESSIONS: usize = 3;

/// One detector's finding in one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeaknessObservation {
    /// Area the finding belongs to.
    pub area: WeaknessArea,
    /// How bad it was in this session.
    pub severity: Severity,
}

type Detector = fn(&Session) -> Option<Severity>;

const DETECTORS: &[(WeaknessArea, Detector)] = &[
    (WeaknessArea::ExcessIteration, excess_iteration),
    (WeaknessArea::SolutionQuality, solution_quality),
    (WeaknessArea::TimeEfficiency, time_efficiency),
    (WeaknessArea::ToolUsage, tool_usage),
    (WeaknessArea::DebuggingLoops, debugging_loops),
    (WeaknessArea::UntestedChanges, untested_changes),
];

/// Run every detector over a session.
#[must_use]
pub fn observe(session: &Session) -> Vec<WeaknessObservation> {
    if session.turns.is_empty() {
        return Vec::new();
    }
    DETECTORS
        .iter()
        .filter_map(|(area, detect)| {
            detect(session).map(|severity| WeaknessObservation { area: *area, severity })
        })
        .collect()
}

/// Many human turns spent pivoting or chasing errors rather than progressing.
fn excess_iteration(session: &Session) -> Option<Severity> {
    let activities = session.human_activities();
    if activities.len() < 6 {
        return None;
    }
    let churn = activities
        .iter()
        .filter(|a| matches!(a, ActivityKind::ErrorHandling | ActivityKind::ConceptualPivot))
        .count() as f64
        / activities.len() as f64;
    match churn {
        c if c >= 0.6 => Some(Severity::Significant),
        c if c >= 0.5 => Some(Severity::Moderate),
        c if c >= 0.4 => Some(Severity::Minor),
        _ => None,
    }
}

fn solution_quality(session: &Session) -> Option<Severity> {
    if session.metrics.human_turns == 0 {
        return None;
    }
    match session.metrics.average_prompt_quality {
        q if q < 30.0 => Some(Severity::Significant),
        q if q < 45.0 => Some(Severity::Moderate),
        q if q < 55.0 => Some(Severity::Minor),
        _ => None,
    }
}

fn time_efficiency(session: &Session) -> Option<Severity> {
    match session.metrics.score_breakdown.efficiency {
        e if e < 30.0 => Some(Severity::Significant),
        e if e < 45.0 => Some(Severity::Moderate),
        _ => None,
    }
}

/// Severity grows with the number of inefficient patterns present.
fn tool_usage(session: &Session) -> Option<Severity> {
    let m = &session.metrics;
    let manual_search = m.tool_count_where(is_manual_search) >= 3 && m.tool_count_where(is_delegation) == 0;
    let blind_reads = m.tool_count_where(is_raw_read) >= 5 && m.tool_count_where(is_structural_overview) == 0;
    let creations = m.tool_count_where(is_file_creation);
    let recreating = creations >= 3 && creations > m.tool_count_where(is_in_place_edit);

    match [manual_search, blind_reads, recreating].iter().filter(|p| **p).count() {
        0 => None,
        1 => Some(Severity::Minor),
        2 => Some(Severity::Moderate),
        _ => Some(Severity::Significant),
    }
}

fn debugging_loops(session: &Session) -> Option<Severity> {
    match session.metrics.loop_count {
        0 if session.metrics.activity_count(ActivityKind::ErrorHandling) >= 4 => Some(Severity::Minor),
        0 => None,
        1 => Some(Severity::Minor),
        2 => Some(Severity::Moderate),
        _ => Some(Severity::Significant),
    }
}

/// Files changed but nothing run and no validation asked for.
fn untested_changes(session: &Session) -> Option<Severity> {
    let m = &session.metrics;
    let writes = m.tool_count_where(is_write_like);
    let executed = m.tool_count_where(|t| ToolCategory::of(t) == ToolCategory::Execute) > 0;
    if writes < 2 || executed || m.activity_count(ActivityKind::Validation) > 0 {
        return None;
    }
    if writes >= 8 {
        Some(Severity::Significant)
    } else {
        Some(Severity::Moderate)
    }
}

fn description(area: WeaknessArea, frequency: usize, total: usize) -> String {
    let what = match area {
        WeaknessArea::ExcessIteration => "Sessions spend most turns pivoting or chasing errors",
        WeaknessArea::SolutionQuality => "Prompts lack the detail needed for a first-pass solution",
        WeaknessArea::TimeEfficiency => "Work proceeds slowly relative to the tokens exchanged",
        WeaknessArea::ToolUsage => "Tools are used in a way that costs extra turns",
        WeaknessArea::DebuggingLoops => "The same failure is fixed and reported again",
        WeaknessArea::UntestedChanges => "Changes are made without running or testing them",
    };
    format!("{what} ({frequency} of {total} sessions)")
}

/// Recommendation set for an area.
#[must_use]
pub fn recommendations(area: WeaknessArea) -> Vec<String> {
    let items: &[&str] = match area {
        WeaknessArea::ExcessIteration => &[
            "Write down the goal and acceptance criteria before starting",
            "Break large requests into smaller, verifiable steps",
            "Pause after two failed attempts and restate the problem",
        ],
        WeaknessArea::SolutionQuality => &[
            "Reference exact files, functions and error messages",
            "State constraints such as performance or compatibility up front",
            "Describe the expected result, not just the symptom",
        ],
        WeaknessArea::TimeEfficiency => &[
            "Batch related requests into a single prompt",
            "Ask for a plan before asking for code on larger tasks",
        ],
        WeaknessArea::ToolUsage => &[
            "Delegate broad searches to a sub-agent instead of repeated grep calls",
            "Get a directory overview before reading files one by one",
            "Prefer editing existing files over recreating them",
        ],
        WeaknessArea::DebuggingLoops => &[
            "Share the full error output and stack trace",
            "Ask for the root cause before asking for a fix",
            "Add a failing test that reproduces the problem",
        ],
        WeaknessArea::UntestedChanges => &[
            "Run the test suite after each change",
            "Ask the agent to add or update tests alongside the change",
        ],
    };
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Aggregate per-session observations into ranked weaknesses.
///
/// `per_session` pairs each session id with its observations, oldest first.
#[must_use]
pub fn aggregate_weaknesses(per_session: &[(String, Vec<WeaknessObservation>)]) -> Vec<UserWeakness> {
    let total = per_session.len();
    if total == 0 {
        return Vec::new();
    }

    let mut by_area: IndexMap<WeaknessArea, Vec<(&str, Severity)>> = IndexMap::new();
    for (session_id, observations) in per_session {
        for obs in observations {
            by_area
                .entry(obs.area)
                .or_default()
                .push((session_id.as_str(), obs.severity));
        }
    }

    let mut weaknesses: Vec<UserWeakness> = by_area
        .into_iter()
        .filter_map(|(area, hits)| {
            let frequency = hits.len();
            let average = hits.iter().map(|(_, s)| f64::from(s.value())).sum::<f64>() / frequency as f64;
            if frequency < MIN_FREQUENCY && average < MIN_AVERAGE_SEVERITY {
                return None;
            }
            let severity = Severity::from_average(average);
            let frequency_percent = 100.0 * frequency as f64 / total as f64;
            let example_sessions = hits
                .iter()
                .rev()
                .take(EXAMPLE_SESSIONS)
                .map(|(id, _)| (*id).to_string())
                .collect();

            Some(UserWeakness {
                area,
                severity,
                frequency,
                frequency_percent,
                description: description(area, frequency, total),
                recommendations: recommendations(area),
                improvement_potential: clamp_score(
                    20.0 * f64::from(severity.value()) + 0.5 * frequency_percent,
                ),
                example_sessions,
            })
        })
        .collect();

    weaknesses.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| b.frequency.cmp(&a.frequency))
    });
    weaknesses
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::model::{Metrics, ProcessedTurn, Role};

    fn session_with(metrics: Metrics) -> Session {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        Session {
            id: "s".into(),
            summary: "s".into(),
            duration_minutes: 30.0,
            turns: vec![ProcessedTurn::new("t", Role::Human, "hi", start)],
            metrics,
            start_time: start,
            end_time: start + Duration::minutes(30),
        }
    }

    fn hit(area: WeaknessArea, severity: Severity) -> WeaknessObservation {
        WeaknessObservation { area, severity }
    }

    #[test]
    fn test_untested_changes_detected() {
        let mut metrics = Metrics::default();
        metrics.human_turns = 1;
        metrics.average_prompt_quality = 80.0;
        metrics.score_breakdown.efficiency = 70.0;
        metrics.tool_usage.insert("Edit".into(), 3);

        let found = observe(&session_with(metrics.clone()));
        assert_eq!(found, vec![hit(WeaknessArea::UntestedChanges, Severity::Moderate)]);

        metrics.tool_usage.insert("Bash".into(), 1);
        assert!(observe(&session_with(metrics)).is_empty());
    }

    #[test]
    fn test_tool_usage_patterns_stack() {
        let mut metrics = Metrics::default();
        metrics.score_breakdown.efficiency = 70.0;
        metrics.tool_usage.insert("Grep".into(), 4);
        metrics.tool_usage.insert("Read".into(), 6);
        metrics.tool_usage.insert("Bash".into(), 1);

        let found = observe(&session_with(metrics));
        assert_eq!(found, vec![hit(WeaknessArea::ToolUsage, Severity::Moderate)]);
    }

    #[test]
    fn test_single_minor_occurrence_dropped() {
        let per_session = vec![
            ("a".to_string(), vec![hit(WeaknessArea::DebuggingLoops, Severity::Minor)]),
            ("b".to_string(), vec![]),
        ];
        assert!(aggregate_weaknesses(&per_session).is_empty());
    }

    #[test]
    fn test_retention_and_ranking() {
        let per_session = vec![
            ("a".to_string(), vec![hit(WeaknessArea::TimeEfficiency, Severity::Moderate)]),
            (
                "b".to_string(),
                vec![
                    hit(WeaknessArea::TimeEfficiency, Severity::Moderate),
                    hit(WeaknessArea::UntestedChanges, Severity::Significant),
                ],
            ),
            ("c".to_string(), vec![hit(WeaknessArea::TimeEfficiency, Severity::Minor)]),
            ("d".to_string(), vec![]),
        ];
        let weaknesses = aggregate_weaknesses(&per_session);
        let areas: Vec<_> = weaknesses.iter().map(|w| w.area).collect();
        assert_eq!(areas, vec![WeaknessArea::UntestedChanges, WeaknessArea::TimeEfficiency]);

        let time = &weaknesses[1];
        assert_eq!(time.frequency, 3);
        assert!((time.frequency_percent - 75.0).abs() < 1e-9);
        // average (2 + 2 + 1) / 3 rounds to moderate
        assert_eq!(time.severity, Severity::Moderate);
        assert!((time.improvement_potential - 77.5).abs() < 1e-9);
        assert_eq!(time.example_sessions, vec!["c", "b", "a"]);

        let untested = &weaknesses[0];
        assert_eq!(untested.frequency, 1);
        assert!((untested.improvement_potential - 72.5).abs() < 1e-9);
    }

    #[test]
    fn test_examples_are_three_most_recent_first() {
        let per_session: Vec<_> = ["a", "b", "c", "d"]
            .iter()
            .map(|id| (id.to_string(), vec![hit(WeaknessArea::DebuggingLoops, Severity::Moderate)]))
            .collect();
        let weaknesses = aggregate_weaknesses(&per_session);
        assert_eq!(weaknesses[0].example_sessions, vec!["d", "c", "b"]);
    }
}
