//! Tendencies, tool preferences and prompt statistics.

use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::metrics::merged_tool_usage;
use crate::model::{
    is_delegation, is_read_like, is_write_like, ActivityKind, CodingTendency, Impact, PromptStats, Session,
    ToolCategory, ToolPreference,
};
use crate::util::word_count;

/// Share of sessions a pattern must appear in to count as a tendency.
const TENDENCY_THRESHOLD_PERCENT: f64 = 25.0;
/// Tool preferences kept.
const TOP_TOOLS: usize = 10;
/// Prompt token estimate per word.
const TOKENS_PER_WORD: f64 = 1.3;

type Pattern = fn(&Session) -> bool;

struct TendencyDef {
    name: &'static str,
    description: &'static str,
    impact: Impact,
    present: Pattern,
}

const TENDENCIES: &[TendencyDef] = &[
    TendencyDef {
        name: "explores_before_editing",
        description: "Reads and searches the code before changing it",
        impact: Impact::Positive,
        present: explores_before_editing,
    },
    TendencyDef {
        name: "plans_upfront",
        description: "Opens with planning or design before implementation",
        impact: Impact::Positive,
        present: plans_upfront,
    },
    TendencyDef {
        name: "validates_changes",
        description: "Asks for tests or verification after changes",
        impact: Impact::Positive,
        present: validates_changes,
    },
    TendencyDef {
        name: "frequent_pivots",
        description: "Changes direction several times per session",
        impact: Impact::Negative,
        present: frequent_pivots,
    },
    TendencyDef {
        name: "long_sessions",
        description: "Works in sessions longer than two hours",
        impact: Impact::Neutral,
        present: long_session,
    },
    TendencyDef {
        name: "terse_prompts",
        description: "Writes short prompts of a few words",
        impact: Impact::Negative,
        present: terse_prompts,
    },
    TendencyDef {
        name: "delegates_search",
        description: "Hands broad searches to sub-agents",
        impact: Impact::Positive,
        present: delegates_search,
    },
    TendencyDef {
        name: "error_driven",
        description: "Most requests are reports of failures",
        impact: Impact::Negative,
        present: error_driven,
    },
];

fn explores_before_editing(session: &Session) -> bool {
    let first_read = session
        .turns
        .iter()
        .position(|t| t.tools.iter().any(|tool| is_read_like(tool)));
    let first_write = session
        .turns
        .iter()
        .position(|t| t.tools.iter().any(|tool| is_write_like(tool)));
    matches!((first_read, first_write), (Some(r), Some(w)) if r < w)
}

fn plans_upfront(session: &Session) -> bool {
    let activities = session.human_activities();
    let first_impl = activities
        .iter()
        .position(|a| *a == ActivityKind::Implementation)
        .unwrap_or(activities.len());
    activities[..first_impl]
        .iter()
        .any(|a| matches!(a, ActivityKind::TaskManagement | ActivityKind::SolutionDesign))
}

fn validates_changes(session: &Session) -> bool {
    session.metrics.activity_count(ActivityKind::Validation) > 0
}

fn frequent_pivots(session: &Session) -> bool {
    session.metrics.activity_count(ActivityKind::ConceptualPivot) >= 3
}

fn long_session(session: &Session) -> bool {
    session.duration_minutes > 120.0
}

fn terse_prompts(session: &Session) -> bool {
    let words: Vec<usize> = prompts(session).map(word_count).collect();
    !words.is_empty() && (words.iter().sum::<usize>() as f64 / words.len() as f64) < 8.0
}

fn delegates_search(session: &Session) -> bool {
    session.metrics.tool_count_where(is_delegation) > 0
}

fn error_driven(session: &Session) -> bool {
    let labeled: usize = session.metrics.activity_distribution.values().sum();
    labeled > 0 && session.metrics.activity_count(ActivityKind::ErrorHandling) * 2 > labeled
}

/// Human prompt texts, excluding harness noise.
fn prompts(session: &Session) -> impl Iterator<Item = &str> {
    session
        .human_turns()
        .filter(|t| !t.is_noise)
        .map(|t| t.content.as_str())
}

/// Patterns present in at least a quarter of the sessions.
#[must_use]
pub fn tendencies(sessions: &[&Session]) -> Vec<CodingTendency> {
    if sessions.is_empty() {
        return Vec::new();
    }
    let total = sessions.len() as f64;
    let mut found: Vec<CodingTendency> = TENDENCIES
        .iter()
        .filter_map(|def| {
            let hits = sessions.iter().filter(|&&s| (def.present)(s)).count();
            let frequency_percent = 100.0 * hits as f64 / total;
            (frequency_percent >= TENDENCY_THRESHOLD_PERCENT).then(|| CodingTendency {
                name: def.name.to_string(),
                description: def.description.to_string(),
                frequency_percent,
                impact: def.impact,
            })
        })
        .collect();
    found.sort_by(|a, b| b.frequency_percent.total_cmp(&a.frequency_percent));
    found
}

/// Most used tools across all sessions.
#[must_use]
pub fn tool_preferences(sessions: &[&Session]) -> Vec<ToolPreference> {
    let usage = merged_tool_usage(sessions.iter().copied());
    let total: usize = usage.values().sum();
    if total == 0 {
        return Vec::new();
    }

    let mut session_counts: IndexMap<&str, usize> = IndexMap::new();
    for session in sessions {
        let used: BTreeSet<&str> = session.metrics.tool_usage.keys().map(String::as_str).collect();
        for tool in used {
            *session_counts.entry(tool).or_default() += 1;
        }
    }

    usage
        .iter()
        .take(TOP_TOOLS)
        .map(|(tool, count)| ToolPreference {
            tool: tool.clone(),
            usage_count: *count,
            session_count: session_counts.get(tool.as_str()).copied().unwrap_or(0),
            share_percent: 100.0 * *count as f64 / total as f64,
            category: ToolCategory::of(tool),
        })
        .collect()
}

/// Counts over non-noise human prompts.
#[must_use]
pub fn prompt_stats(sessions: &[&Session]) -> PromptStats {
    let words: Vec<usize> = sessions
        .iter()
        .copied()
        .flat_map(prompts)
        .map(word_count)
        .collect();
    let total_words: usize = words.iter().sum();
    let total_prompts = words.len();

    PromptStats {
        total_prompts,
        average_words: if total_prompts == 0 {
            0.0
        } else {
            total_words as f64 / total_prompts as f64
        },
        prompts_per_session: if sessions.is_empty() {
            0.0
        } else {
            total_prompts as f64 / sessions.len() as f64
        },
        estimated_tokens: (total_words as f64 * TOKENS_PER_WORD).round() as u64,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{Metrics, ProcessedTurn, Role};

    fn session(id: &str, turns: Vec<ProcessedTurn>, tools: &[(&str, usize)]) -> Session {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let mut metrics = Metrics::default();
        for (tool, count) in tools {
            metrics.tool_usage.insert((*tool).to_string(), *count);
        }
        Session {
            id: id.into(),
            summary: id.into(),
            duration_minutes: 20.0,
            turns,
            metrics,
            start_time: start,
            end_time: start + Duration::minutes(20),
        }
    }

    fn human(text: &str) -> ProcessedTurn {
        ProcessedTurn::new("h", Role::Human, text, Utc::now())
    }

    #[test]
    fn test_prompt_stats_skip_noise() {
        let mut noise = human("[Request interrupted by user]");
        noise.is_noise = true;
        let a = session("a", vec![human("add a cache layer"), noise], &[]);
        let b = session("b", vec![human("now write tests for it please")], &[]);

        let stats = prompt_stats(&[&a, &b]);
        assert_eq!(stats.total_prompts, 2);
        assert!((stats.average_words - 5.0).abs() < 1e-9);
        assert!((stats.prompts_per_session - 1.0).abs() < 1e-9);
        assert_eq!(stats.estimated_tokens, 13);
    }

    #[test]
    fn test_tool_preferences_ranked() {
        let a = session("a", Vec::new(), &[("Read", 5), ("Edit", 2)]);
        let b = session("b", Vec::new(), &[("Edit", 2), ("Bash", 1)]);

        let prefs = tool_preferences(&[&a, &b]);
        let names: Vec<_> = prefs.iter().map(|p| p.tool.as_str()).collect();
        assert_eq!(names, vec!["Read", "Edit", "Bash"]);
        assert_eq!(prefs[1].session_count, 2);
        assert_eq!(prefs[0].category, ToolCategory::Read);
        assert!((prefs[0].share_percent - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_terse_prompts_tendency() {
        let a = session("a", vec![human("fix it"), human("again")], &[]);
        let b = session(
            "b",
            vec![human("please refactor the storage layer so that writes are atomic")],
            &[],
        );
        let found = tendencies(&[&a, &b]);
        let terse = found.iter().find(|t| t.name == "terse_prompts").unwrap();
        assert!((terse.frequency_percent - 50.0).abs() < 1e-9);
        assert_eq!(terse.impact, Impact::Negative);
        assert!(found.iter().all(|t| t.name != "long_sessions"));
    }
}
