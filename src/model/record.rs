//! Log records - one line of a session log.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::content::TurnContent;
use super::usage::TokenUsage;
use crate::error::{Result, TurnscopeError};

/// Record kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Authored by the human operator.
    Human,
    /// Authored by the coding agent.
    Agent,
    /// Conversation summary; never becomes a turn.
    Summary,
}

/// Turn author role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Human operator.
    Human,
    /// Coding agent.
    Agent,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Human => write!(f, "human"),
            Self::Agent => write!(f, "agent"),
        }
    }
}

/// The message body of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Author role.
    pub role: Role,

    /// Message content; must be present and non-null.
    pub content: TurnContent,

    /// Token usage, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

/// One atomic log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    /// Record kind.
    pub kind: RecordKind,

    /// Unique record identifier.
    pub id: String,

    /// Parent record identifier; `None` for roots.
    #[serde(default)]
    pub parent_id: Option<String>,

    /// When the record was written.
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,

    /// Session this record belongs to.
    pub session_id: String,

    /// Message body.
    pub turn: Turn,

    /// Opaque tool result payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_result: Option<Value>,
}

impl LogRecord {
    /// Check the invariants serde cannot express.
    pub fn validate(&self, line: usize) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(TurnscopeError::parse(line, "field `id` must not be empty"));
        }
        if self.session_id.trim().is_empty() {
            return Err(TurnscopeError::parse(line, "field `sessionId` must not be empty"));
        }
        Ok(())
    }

    /// Flattened text content of the turn.
    #[must_use]
    pub fn text(&self) -> String {
        self.turn.content.text()
    }

    /// Check if this record is a forest root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_id.as_deref().map_or(true, str::is_empty)
    }

    /// Parent id, treating empty strings as absent.
    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.parent_id.as_deref().filter(|p| !p.is_empty())
    }

    /// Check if this is a summary record.
    #[must_use]
    pub fn is_summary(&self) -> bool {
        self.kind == RecordKind::Summary
    }
}

/// Accept RFC 3339 timestamps and offset-less ISO-8601 timestamps (read as UTC).
fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("invalid ISO-8601 timestamp: {raw}"))
    })
}

/// Parse an ISO-8601 timestamp.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
