//! Turn content for agent session logs.
//!
//! A turn's `content` is either a plain string or an array of typed segments:
//! - `text`: natural language
//! - `tool_use`: a tool invocation request
//! - `tool_result`: a tool execution outcome
//! - `thinking`: extended reasoning
//! - `image`: visual input
//!
//! Segment types this crate does not know about deserialize as [`ContentSegment::Unknown`]
//! so that newer log producers do not break parsing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Turn content - plain text or a sequence of typed segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TurnContent {
    /// Plain text content.
    Text(String),
    /// Typed content segments.
    Segments(Vec<ContentSegment>),
}

impl TurnContent {
    /// Flatten the content into plain text.
    ///
    /// Only text segments contribute; they are joined with newlines.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Segments(segments) => segments
                .iter()
                .filter_map(|s| match s {
                    ContentSegment::Text(t) => Some(t.text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Names of tools invoked through `tool_use` segments, in order, duplicates kept.
    #[must_use]
    pub fn tool_use_names(&self) -> Vec<&str> {
        match self {
            Self::Text(_) => Vec::new(),
            Self::Segments(segments) => segments
                .iter()
                .filter_map(|s| match s {
                    ContentSegment::ToolUse(t) => Some(t.name.as_str()),
                    _ => None,
                })
                .collect(),
        }
    }

    /// Check if the content carries no text and no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::Segments(segments) => segments.is_empty(),
        }
    }
}

impl Default for TurnContent {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl From<&str> for TurnContent {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// A typed content segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentSegment {
    /// Natural language text.
    Text(TextSegment),

    /// Tool invocation request.
    ToolUse(ToolUseSegment),

    /// Tool execution outcome.
    ToolResult(ToolResultSegment),

    /// Extended reasoning.
    Thinking(ThinkingSegment),

    /// Visual input.
    Image(ImageSegment),

    /// Any segment type not listed above.
    #[serde(other)]
    Unknown,
}

impl ContentSegment {
    /// Get the type name of this segment.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::ToolUse(_) => "tool_use",
            Self::ToolResult(_) => "tool_result",
            Self::Thinking(_) => "thinking",
            Self::Image(_) => "image",
            Self::Unknown => "unknown",
        }
    }
}

/// Text segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSegment {
    /// The text content.
    pub text: String,
}

/// Tool use segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolUseSegment {
    /// Tool use ID, when the producer assigns one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Tool name.
    pub name: String,

    /// Tool input parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
}

/// Tool result segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResultSegment {
    /// Links back to the originating tool use.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_use_id: Option<String>,

    /// Result payload (string or array).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,

    /// Error state (three-state: true/false/absent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

/// Thinking segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThinkingSegment {
    /// Reasoning text.
    pub thinking: String,
}

/// Image segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSegment {
    /// Image source descriptor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,
}
