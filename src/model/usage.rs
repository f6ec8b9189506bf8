//! Token usage attached to a turn.

use serde::{Deserialize, Serialize};

/// Token statistics reported for one turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    /// Input (prompt) tokens.
    #[serde(default, alias = "input_tokens")]
    pub input_tokens: u64,

    /// Generated output tokens.
    #[serde(default, alias = "output_tokens")]
    pub output_tokens: u64,
}

impl TokenUsage {
    /// Create a usage record.
    #[must_use]
    pub const fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Calculate total tokens (input + output).
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}
