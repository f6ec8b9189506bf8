//! Keyword vocabularies for activity rules.
//!
//! Every vocabulary is a case-insensitive regex compiled once on first use.

use once_cell::sync::Lazy;
use regex::Regex;

static TASK_MANAGEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:plan(?:s|ned|ning)?|todos?|to-do|prioriti[sz]\w*|organi[sz]\w*|roadmap|milestones?|checklist|break (?:it |this |that )?down|next steps|task list|backlog)\b",
    )
    .unwrap()
});

static ERROR_HANDLING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:errors?|bugs?|buggy|fail(?:s|ed|ing|ure|ures)?|crash(?:es|ed|ing)?|broken|exceptions?|traceback|stack ?trace|panic(?:s|ked)?|not working|doesn't work|does not work|issues?|fix(?:es|ed|ing)?|debug(?:ging)?|regression)\b",
    )
    .unwrap()
});

static IMPLEMENTATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:implement(?:s|ed|ing|ation)?|build(?:s|ing)?|creat(?:e|es|ed|ing)|add(?:s|ed|ing)?|writ(?:e|es|ing)|wrote|modif(?:y|ies|ied|ying)|updat(?:e|es|ed|ing)|chang(?:e|es|ed|ing)|refactor(?:s|ed|ing)?|mak(?:e|es|ing)|generat(?:e|es|ed|ing)|renam(?:e|es|ed|ing)|remov(?:e|es|ed|ing)|delet(?:e|es|ed|ing)|extend(?:s|ed|ing)?|convert(?:s|ed|ing)?|migrat(?:e|es|ed|ing))\b",
    )
    .unwrap()
});

static EXPLANATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:explain(?:s|ed|ing)?|explanation|understand(?:ing)?|how does|how do|why does|why is|walk me through|what does|in detail|elaborate|clarify|deep dive|under the hood)\b",
    )
    .unwrap()
});

static PIVOT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:instead|actually|wait|scratch that|on second thought|rather|different approach|change of plans?|never ?mind)\b",
    )
    .unwrap()
});

static EXPLORATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:find|search(?:es|ing)?|locate|where is|where are|look for|look at|grep|list|show me|which files?|explore|browse)\b",
    )
    .unwrap()
});

static VALIDATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:tests?|testing|verif(?:y|ies|ied|ication)|validat(?:e|es|ed|ing|ion)|check(?:s|ed|ing)?|confirm(?:s|ed)?|ensure|assert(?:s|ion)?|run the suite)\b",
    )
    .unwrap()
});

static DESIGN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:architecture|architect|design(?:s|ed|ing)?|approach(?:es)?|strateg(?:y|ies)|patterns?|structure|trade-?offs?|best way|alternatives?|pros and cons)\b",
    )
    .unwrap()
});

static CLOSING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:that's all|that is all|we're done|we are done|ship it|all done|wrap(?:ping)? up|looks good,? merge|good to go)\b")
        .unwrap()
});

static ACKNOWLEDGEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?:ok(?:ay)?|thanks|thank you|thx|continue|go on|go ahead|proceed|yes|yep|sure|lgtm|sounds good|great|perfect|nice|cool|next)\b",
    )
    .unwrap()
});

static WH_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:what|why|how|where|when|which|who|whose)\b").unwrap());

/// A named keyword vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vocabulary {
    /// Planning and organizing.
    TaskManagement,
    /// Failures and defects.
    ErrorHandling,
    /// Building, creating, modifying.
    Implementation,
    /// Seeking explanation.
    Explanation,
    /// Changing direction.
    Pivot,
    /// Searching and locating.
    Exploration,
    /// Testing and verifying.
    Validation,
    /// Architecture and approach.
    Design,
    /// Wrapping up.
    Closing,
    /// Short acknowledgement at the start of a turn.
    Acknowledgement,
    /// Question mark or wh-word.
    Interrogative,
}

impl Vocabulary {
    /// Check if `text` uses this vocabulary.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Self::TaskManagement => TASK_MANAGEMENT.is_match(text),
            Self::ErrorHandling => ERROR_HANDLING.is_match(text),
            Self::Implementation => IMPLEMENTATION.is_match(text),
            Self::Explanation => EXPLANATION.is_match(text),
            Self::Pivot => PIVOT.is_match(text),
            Self::Exploration => EXPLORATION.is_match(text),
            Self::Validation => VALIDATION.is_match(text),
            Self::Design => DESIGN.is_match(text),
            Self::Closing => CLOSING.is_match(text),
            Self::Acknowledgement => ACKNOWLEDGEMENT.is_match(text),
            Self::Interrogative => text.contains('?') || WH_WORD.is_match(text),
        }
    }
}

/// Jaccard similarity of lowercase whitespace-token sets.
///
/// Two empty texts are identical (1.0); one empty text shares nothing (0.0).
#[must_use]
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    use std::collections::HashSet;

    let lower_a = a.to_lowercase();
    let lower_b = b.to_lowercase();
    let set_a: HashSet<&str> = lower_a.split_whitespace().collect();
    let set_b: HashSet<&str> = lower_b.split_whitespace().collect();

    if set_a.is_empty() && set_b.is_empty() {
        return 1.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    intersection as f64 / union as f64
}
