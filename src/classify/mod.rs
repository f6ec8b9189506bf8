//! Activity classification for conversation turns.
//!
//! Human turns are labeled by an ordered rule list; the first matching rule wins.
//! Agent turns inherit the label of the human turn they answer, or fall back to
//! the category of the tools they invoke.

mod vocabulary;

pub use vocabulary::{jaccard_similarity, Vocabulary};

use tracing::{instrument, trace};

use crate::config::ClassifierConfig;
use crate::model::{is_read_like, ActivityKind, ProcessedTurn, ToolCategory};

/// A condition evaluated against a human turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// No previous turn, or a long pause since it.
    Restart,
    /// The turn text uses a vocabulary.
    Mentions(Vocabulary),
    /// Many read-like tool invocations, or explanatory vocabulary.
    DeepDive,
    /// Pivot vocabulary, or little lexical overlap with the previous human turn.
    Pivot,
    /// Closing vocabulary with no later human turn.
    Closing,
}

/// Human-turn rules in precedence order.
pub const HUMAN_RULES: &[(Rule, ActivityKind)] = &[
    (Rule::Restart, ActivityKind::InitialQuestion),
    (Rule::Mentions(Vocabulary::TaskManagement), ActivityKind::TaskManagement),
    (Rule::Mentions(Vocabulary::ErrorHandling), ActivityKind::ErrorHandling),
    (Rule::Mentions(Vocabulary::Implementation), ActivityKind::Implementation),
    (Rule::DeepDive, ActivityKind::DeepDive),
    (Rule::Pivot, ActivityKind::ConceptualPivot),
    (Rule::Mentions(Vocabulary::Exploration), ActivityKind::CodeExploration),
    (Rule::Mentions(Vocabulary::Validation), ActivityKind::Validation),
    (Rule::Mentions(Vocabulary::Design), ActivityKind::SolutionDesign),
    (Rule::Closing, ActivityKind::Completion),
    (Rule::Mentions(Vocabulary::Acknowledgement), ActivityKind::CodeExploration),
    (Rule::Mentions(Vocabulary::Interrogative), ActivityKind::CodeExploration),
];

/// Label for human turns no rule matches.
pub const FALLBACK_ACTIVITY: ActivityKind = ActivityKind::Implementation;

/// Surrounding turns a rule may look at.
#[derive(Debug, Clone, Copy, Default)]
struct Context<'a> {
    /// Turn immediately before.
    previous: Option<&'a ProcessedTurn>,
    /// Most recent human turn before.
    previous_human: Option<&'a ProcessedTurn>,
    /// Whether a human turn follows later on.
    human_follows: bool,
}

/// Rule-based activity classifier.
#[derive(Debug, Clone, Default)]
pub struct ActivityClassifier {
    config: ClassifierConfig,
}

impl ActivityClassifier {
    /// Create a classifier with default thresholds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a classifier from configuration.
    #[must_use]
    pub fn with_config(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify one turn given its neighbours.
    ///
    /// An agent turn inherits from `previous` only when that is a labeled human turn.
    #[must_use]
    pub fn classify(
        &self,
        turn: &ProcessedTurn,
        previous: Option<&ProcessedTurn>,
        next: Option<&ProcessedTurn>,
    ) -> ActivityKind {
        if !turn.is_human() {
            let inherited = previous.filter(|p| p.is_human()).and_then(|p| p.activity);
            return inherited.unwrap_or_else(|| tool_activity(&turn.tools));
        }

        let ctx = Context {
            previous,
            previous_human: previous.filter(|p| p.is_human()),
            human_follows: next.is_some_and(ProcessedTurn::is_human),
        };
        self.classify_human(turn, &ctx)
    }

    /// Label every turn of a session in place, in order.
    ///
    /// Turns that already carry a label keep it.
    #[instrument(skip(self, turns), fields(turns = turns.len()))]
    pub fn classify_session(&self, turns: &mut [ProcessedTurn]) {
        let mut last_human: Option<usize> = None;
        let mut last_human_label: Option<ActivityKind> = None;

        for i in 0..turns.len() {
            let label = if turns[i].is_human() {
                let human_follows = turns[i + 1..].iter().any(ProcessedTurn::is_human);
                let ctx = Context {
                    previous: i.checked_sub(1).map(|p| &turns[p]),
                    previous_human: last_human.map(|p| &turns[p]),
                    human_follows,
                };
                let label = turns[i].activity.unwrap_or_else(|| self.classify_human(&turns[i], &ctx));
                last_human = Some(i);
                last_human_label = Some(label);
                label
            } else {
                turns[i]
                    .activity
                    .or(last_human_label)
                    .unwrap_or_else(|| tool_activity(&turns[i].tools))
            };
            turns[i].set_activity(label);
        }
    }

    fn classify_human(&self, turn: &ProcessedTurn, ctx: &Context<'_>) -> ActivityKind {
        let label = HUMAN_RULES
            .iter()
            .find(|(rule, _)| self.rule_matches(*rule, turn, ctx))
            .map_or(FALLBACK_ACTIVITY, |(_, kind)| *kind);
        trace!(turn = %turn.id, activity = %label, "Classified human turn");
        label
    }

    fn rule_matches(&self, rule: Rule, turn: &ProcessedTurn, ctx: &Context<'_>) -> bool {
        match rule {
            Rule::Restart => ctx.previous.map_or(true, |prev| {
                turn.minutes_since(prev) >= self.config.restart_gap_minutes as f64
            }),
            Rule::Mentions(vocabulary) => vocabulary.matches(&turn.content),
            Rule::DeepDive => {
                turn.tools.iter().filter(|t| is_read_like(t)).count() > self.config.deep_dive_read_threshold
                    || Vocabulary::Explanation.matches(&turn.content)
            }
            Rule::Pivot => {
                Vocabulary::Pivot.matches(&turn.content)
                    || ctx.previous_human.is_some_and(|prev| {
                        jaccard_similarity(&turn.content, &prev.content)
                            < self.config.pivot_similarity_threshold
                    })
            }
            Rule::Closing => !ctx.human_follows && Vocabulary::Closing.matches(&turn.content),
        }
    }
}

/// Activity implied by the tools an agent turn invokes.
///
/// Precedence: write, read, execute, plan. Turns with no recognised tool default
/// to code exploration.
#[must_use]
pub fn tool_activity(tools: &[String]) -> ActivityKind {
    let has = |category: ToolCategory| tools.iter().any(|t| ToolCategory::of(t) == category);

    if has(ToolCategory::Write) {
        ActivityKind::Implementation
    } else if has(ToolCategory::Read) {
        ActivityKind::CodeExploration
    } else if has(ToolCategory::Execute) {
        ActivityKind::Validation
    } else if has(ToolCategory::Plan) {
        ActivityKind::TaskManagement
    } else {
        ActivityKind::CodeExploration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rstest::rstest;

    use crate::model::Role;

    fn at(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn human(id: &str, text: &str, minute: i64) -> ProcessedTurn {
        ProcessedTurn::new(id, Role::Human, text, at(minute))
    }

    fn agent(id: &str, tools: &[&str], minute: i64) -> ProcessedTurn {
        let mut t = ProcessedTurn::new(id, Role::Agent, "working on it", at(minute));
        t.tools = tools.iter().map(|s| (*s).to_string()).collect();
        t
    }

    #[test]
    fn test_first_turn_is_initial_question() {
        let c = ActivityClassifier::new();
        assert_eq!(
            c.classify(&human("h", "fix the bug", 0), None, None),
            ActivityKind::InitialQuestion
        );
    }

    #[test]
    fn test_long_gap_restarts() {
        let c = ActivityClassifier::new();
        let prev = human("h1", "implement the parser", 0);
        let turn = human("h2", "implement the parser", 20);
        assert_eq!(c.classify(&turn, Some(&prev), None), ActivityKind::InitialQuestion);

        let soon = human("h3", "implement the parser", 5);
        assert_eq!(c.classify(&soon, Some(&prev), None), ActivityKind::Implementation);
    }

    #[rstest]
    #[case("let's plan the milestones for the release", ActivityKind::TaskManagement)]
    #[case("there's an error when I log in", ActivityKind::ErrorHandling)]
    #[case("please add a logout button", ActivityKind::Implementation)]
    #[case("explain how the router dispatches requests", ActivityKind::DeepDive)]
    #[case("actually let's use postgres", ActivityKind::ConceptualPivot)]
    fn test_vocabulary_rules(#[case] text: &str, #[case] expected: ActivityKind) {
        let c = ActivityClassifier::new();
        let prev = human("p", "", 0);
        let turn = human("t", text, 1);
        assert_eq!(c.classify(&turn, Some(&prev), None), expected);
    }

    #[test]
    fn test_precedence_error_over_implementation() {
        let c = ActivityClassifier::new();
        let prev = human("p", "x", 0);
        let turn = human("t", "fix the failing build and add a test", 1);
        assert_eq!(c.classify(&turn, Some(&prev), None), ActivityKind::ErrorHandling);
    }

    #[test]
    fn test_low_overlap_is_pivot() {
        let c = ActivityClassifier::new();
        let prev = human("p", "show me the config loader", 0);
        let turn = human("t", "where do we store sessions", 1);
        assert_eq!(c.classify(&turn, Some(&prev), None), ActivityKind::ConceptualPivot);
    }

    #[test]
    fn test_high_overlap_falls_through() {
        let c = ActivityClassifier::new();
        let prev = human("p", "show me the config loader please", 0);
        let similar = human("t", "show me the config loader tests please", 1);
        assert_eq!(c.classify(&similar, Some(&prev), None), ActivityKind::CodeExploration);
    }

    #[test]
    fn test_reads_trigger_deep_dive() {
        let c = ActivityClassifier::new();
        let prev = human("p", "look", 0);
        let mut turn = human("t", "look", 1);
        turn.tools = vec!["Read".into(), "Grep".into(), "Glob".into(), "Read".into()];
        assert_eq!(c.classify(&turn, Some(&prev), None), ActivityKind::DeepDive);
    }

    #[test]
    fn test_closing_only_without_follow_up() {
        let c = ActivityClassifier::new();
        let prev = human("p", "that's all for now", 0);
        let turn = human("t", "that's all for now", 1);
        assert_eq!(c.classify(&turn, Some(&prev), None), ActivityKind::Completion);

        let next = human("n", "one more", 2);
        assert_ne!(c.classify(&turn, Some(&prev), Some(&next)), ActivityKind::Completion);
    }

    #[test]
    fn test_fallbacks() {
        let c = ActivityClassifier::new();
        let prev = human("p", "ok", 0);
        assert_eq!(c.classify(&human("t", "ok", 1), Some(&prev), None), ActivityKind::CodeExploration);

        let prev = human("p", "so is it", 0);
        assert_eq!(c.classify(&human("t", "so is it?", 1), Some(&prev), None), ActivityKind::CodeExploration);

        let prev = human("p", "do it now", 0);
        assert_eq!(c.classify(&human("t", "do it now", 1), Some(&prev), None), FALLBACK_ACTIVITY);
    }

    #[test]
    fn test_agent_inherits_from_labeled_human() {
        let c = ActivityClassifier::new();
        let mut prev = human("h", "fix it", 0);
        prev.set_activity(ActivityKind::ErrorHandling);
        let reply = agent("a", &["Edit"], 1);
        assert_eq!(c.classify(&reply, Some(&prev), None), ActivityKind::ErrorHandling);
    }

    #[rstest]
    #[case(&["Read", "Edit"], ActivityKind::Implementation)]
    #[case(&["Grep"], ActivityKind::CodeExploration)]
    #[case(&["Bash"], ActivityKind::Validation)]
    #[case(&["TodoWrite"], ActivityKind::TaskManagement)]
    #[case(&[], ActivityKind::CodeExploration)]
    fn test_agent_tool_fallback(#[case] tools: &[&str], #[case] expected: ActivityKind) {
        let c = ActivityClassifier::new();
        assert_eq!(c.classify(&agent("a", tools, 0), None, None), expected);
    }

    #[test]
    fn test_classify_session_threads_context() {
        let c = ActivityClassifier::new();
        let mut turns = vec![
            human("h1", "fix the login bug", 0),
            agent("a1", &["Read"], 1),
            agent("a2", &["Edit"], 2),
            human("h2", "fix the login bug on mobile too", 3),
            agent("a3", &["Bash"], 4),
        ];
        c.classify_session(&mut turns);

        let labels: Vec<_> = turns.iter().map(|t| t.activity.unwrap()).collect();
        assert_eq!(
            labels,
            vec![
                ActivityKind::InitialQuestion,
                ActivityKind::InitialQuestion,
                ActivityKind::InitialQuestion,
                ActivityKind::ErrorHandling,
                ActivityKind::ErrorHandling,
            ]
        );
    }

    #[test]
    fn test_classify_session_keeps_existing_labels() {
        let c = ActivityClassifier::new();
        let mut turns = vec![human("h1", "hello", 0)];
        turns[0].set_activity(ActivityKind::Validation);
        c.classify_session(&mut turns);
        assert_eq!(turns[0].activity, Some(ActivityKind::Validation));
    }
}
