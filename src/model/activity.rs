//! Activity taxonomy for conversation turns.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TurnscopeError;

/// The intent of a turn. Exactly ten kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// Opening question, or a restart after a long pause.
    InitialQuestion,
    /// Planning and organizing work.
    TaskManagement,
    /// Building, creating or modifying code.
    Implementation,
    /// Reporting or chasing failures and defects.
    ErrorHandling,
    /// Seeking explanation and understanding.
    DeepDive,
    /// Changing direction.
    ConceptualPivot,
    /// Searching and locating code.
    CodeExploration,
    /// Testing and verifying.
    Validation,
    /// Architecture and approach discussion.
    SolutionDesign,
    /// Wrapping the work up.
    Completion,
}

impl ActivityKind {
    /// Every kind, in taxonomy order.
    pub const ALL: [ActivityKind; 10] = [
        Self::InitialQuestion,
        Self::TaskManagement,
        Self::Implementation,
        Self::ErrorHandling,
        Self::DeepDive,
        Self::ConceptualPivot,
        Self::CodeExploration,
        Self::Validation,
        Self::SolutionDesign,
        Self::Completion,
    ];

    /// Get the snake_case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InitialQuestion => "initial_question",
            Self::TaskManagement => "task_management",
            Self::Implementation => "implementation",
            Self::ErrorHandling => "error_handling",
            Self::DeepDive => "deep_dive",
            Self::ConceptualPivot => "conceptual_pivot",
            Self::CodeExploration => "code_exploration",
            Self::Validation => "validation",
            Self::SolutionDesign => "solution_design",
            Self::Completion => "completion",
        }
    }

    /// Kinds that move the work forward.
    #[must_use]
    pub const fn is_productive(&self) -> bool {
        matches!(
            self,
            Self::Implementation | Self::SolutionDesign | Self::Validation | Self::Completion
        )
    }
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityKind {
    type Err = TurnscopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| TurnscopeError::InvalidArgument {
                name: "activity".to_string(),
                reason: format!("unknown activity kind '{s}'"),
            })
    }
}
