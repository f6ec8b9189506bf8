//! Prompt quality scoring.
//!
//! A human prompt scores 0-100 as a weighted sum of five sub-scores:
//!
//! | Sub-score     | Weight | Rewards                                                       |
//! |---------------|--------|---------------------------------------------------------------|
//! | specificity   | 30%    | code references, technical vocabulary, 50-500 char length     |
//! | clarity       | 25%    | questions, directives, bullet or numbered structure           |
//! | context       | 20%    | length, technical vocabulary, code references, constraints    |
//! | actionability | 15%    | directives, next-step language, constraints                   |
//! | scope         | 10%    | scope-limiting language, 30-400 char length                   |
//!
//! Each sub-score is clamped to [0, 100] before weighting.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::ProcessedTurn;
use crate::util::clamp_score;

static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`[^`\n]+`").unwrap());

static FUNCTION_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z_][\w:.]*\([^()\n]*\)").unwrap());

static FILE_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:\b[\w.-]+/)+[\w.-]+|\b[\w-]+\.(?:rs|py|ts|tsx|js|jsx|go|java|kt|rb|c|cc|cpp|h|hpp|cs|swift|toml|json|ya?ml|md|sql|sh|html|css)\b",
    )
    .unwrap()
});

static TECHNICAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:functions?|methods?|class(?:es)?|structs?|enums?|traits?|interfaces?|modules?|types?|generics?|api|endpoints?|database|queries|query|schema|cache|async|await|threads?|mutex|locks?|concurren\w*|algorithms?|complexity|regex|parser|compiler|dependenc(?:y|ies)|config(?:uration)?|json|http|sql|index(?:es)?|latency|performance|memory|variables?|recursion|iterators?|closures?|callbacks?|middleware|migrations?|serializ\w*|vec(?:tor)?s?|arrays?|hash ?maps?|linked list|binary search|sort(?:ed|ing)?|intervals?)\b",
    )
    .unwrap()
});

static DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:add|implement|create|fix|write|update|refactor|remove|delete|rename|build|make|change|move|extract|optimi[sz]e|convert|replace|ensure|use|return|handle|support|run)\b",
    )
    .unwrap()
});

static QUESTION_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:what|why|how|where|when|which|who|can|could|should|would|is|are|does|do)\b")
        .unwrap()
});

static STRUCTURE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*(?:[-*•]|\d+[.)])\s+\S").unwrap());

static CONSTRAINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:must|should|without|at most|at least|no more than|less than|within|avoid|don't|do not|never|always|limit(?:ed)?|requires?|required|constraints?)\b|O\([^)\n]*\)",
    )
    .unwrap()
});

static NEXT_STEP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:then|next|after that|afterwards|finally|step \d+|once (?:done|that's done)|so that|followed by)\b")
        .unwrap()
});

static SCOPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:only|just|specifically|limited to|scope|focus on|this (?:function|file|module|method)|in (?:the )?file|don't touch|do not (?:change|modify|touch)|without changing|leave .{1,40} (?:alone|as is))\b",
    )
    .unwrap()
});

/// Sub-scores behind a prompt quality score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptScores {
    /// Code references, technical vocabulary, ideal length.
    pub specificity: f64,
    /// Questions, directives, structure.
    pub clarity: f64,
    /// Background the agent can act on.
    pub context: f64,
    /// Directives, next steps, constraints.
    pub actionability: f64,
    /// Scope limits and moderate length.
    pub scope: f64,
}

impl PromptScores {
    /// Weighted, rounded total.
    #[must_use]
    pub fn total(&self) -> u8 {
        let weighted = 0.30 * self.specificity
            + 0.25 * self.clarity
            + 0.20 * self.context
            + 0.15 * self.actionability
            + 0.10 * self.scope;
        clamp_score(weighted).round() as u8
    }
}

/// Features counted once per prompt.
#[derive(Debug, Clone, Copy, Default)]
struct Features {
    chars: usize,
    code_refs: usize,
    technical: usize,
    interrogative: bool,
    directive: bool,
    structure_lines: usize,
    constraints: usize,
    next_steps: bool,
    scoped: bool,
}

impl Features {
    fn of(text: &str) -> Self {
        let fences = text.matches("```").count() / 2;
        // Keep fenced blocks out of the inline-code count.
        let outside_fences: String = text.split("```").step_by(2).collect::<Vec<_>>().join(" ");

        Self {
            chars: text.chars().count(),
            code_refs: INLINE_CODE.find_iter(&outside_fences).count()
                + fences
                + FUNCTION_CALL.find_iter(&outside_fences).count()
                + FILE_PATH.find_iter(&outside_fences).count(),
            technical: TECHNICAL.find_iter(text).count(),
            interrogative: text.contains('?') || QUESTION_START.is_match(text),
            directive: DIRECTIVE.is_match(text),
            structure_lines: STRUCTURE_LINE.find_iter(text).count(),
            constraints: CONSTRAINT.find_iter(text).count(),
            next_steps: NEXT_STEP.is_match(text),
            scoped: SCOPE.is_match(text),
        }
    }
}

fn capped(count: usize, per: f64, cap: f64) -> f64 {
    (count as f64 * per).min(cap)
}

fn specificity(f: &Features) -> f64 {
    let length_bonus = match f.chars {
        50..=500 => 25.0,
        20..=49 | 501..=1000 => 10.0,
        _ => 0.0,
    };
    clamp_score(capped(f.code_refs, 15.0, 45.0) + capped(f.technical, 8.0, 30.0) + length_bonus)
}

fn clarity(f: &Features) -> f64 {
    let mut score = 20.0;
    if f.interrogative {
        score += 20.0;
    }
    if f.directive {
        score += 25.0;
    }
    score += capped(f.structure_lines, 15.0, 30.0);
    if f.chars >= 20 {
        score += 10.0;
    }
    clamp_score(score)
}

fn context(f: &Features) -> f64 {
    clamp_score(
        (f.chars as f64 / 10.0).min(30.0)
            + capped(f.technical, 6.0, 25.0)
            + capped(f.code_refs, 10.0, 25.0)
            + capped(f.constraints, 10.0, 20.0),
    )
}

fn actionability(f: &Features) -> f64 {
    let mut score = 0.0;
    if f.directive {
        score += 40.0;
    }
    if f.next_steps {
        score += 30.0;
    }
    score += capped(f.constraints, 10.0, 30.0);
    clamp_score(score)
}

fn scope(f: &Features) -> f64 {
    let mut score = if f.scoped { 50.0 } else { 0.0 };
    score += match f.chars {
        30..=400 => 40.0,
        0..=29 => 10.0,
        _ => 20.0,
    };
    clamp_score(score)
}

/// Score prompt text.
#[must_use]
pub fn prompt_scores(text: &str) -> PromptScores {
    let f = Features::of(text.trim());
    PromptScores {
        specificity: specificity(&f),
        clarity: clarity(&f),
        context: context(&f),
        actionability: actionability(&f),
        scope: scope(&f),
    }
}

/// Prompt quality of a turn, 0-100. Agent turns always score 0.
#[must_use]
pub fn score_prompt(turn: &ProcessedTurn) -> u8 {
    if !turn.is_human() {
        return 0;
    }
    prompt_scores(&turn.content).total()
}
