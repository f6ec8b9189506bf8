//! Tool taxonomy.
//!
//! Agent tool names are grouped into a handful of categories that the classifier,
//! the scorer and the profile analyzers reason about. Matching is case-insensitive
//! and tolerant of the snake_case spellings some agents use.

use serde::{Deserialize, Serialize};

/// Tool names recognised when scanning free text for tool mentions.
pub const KNOWN_TOOLS: &[&str] = &[
    "Read",
    "Write",
    "Edit",
    "MultiEdit",
    "Bash",
    "BashOutput",
    "KillShell",
    "Grep",
    "Glob",
    "LS",
    "Task",
    "TodoWrite",
    "TodoRead",
    "WebFetch",
    "WebSearch",
    "NotebookEdit",
    "NotebookRead",
    "ExitPlanMode",
    "EnterPlanMode",
];

/// Broad category of an agent tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    /// Creates or modifies files.
    Write,
    /// Reads, searches or lists code and documents.
    Read,
    /// Runs commands.
    Execute,
    /// Tracks plans and task lists.
    Plan,
    /// Anything else (MCP tools, unknown names).
    Other,
}

impl ToolCategory {
    /// Categorise a tool by name.
    #[must_use]
    pub fn of(name: &str) -> Self {
        match normalize(name).as_str() {
            "write" | "edit" | "multiedit" | "notebookedit" | "strreplaceeditor" | "strreplace"
            | "createfile" | "applypatch" | "writefile" | "editfile" => Self::Write,
            "read" | "readfile" | "notebookread" | "grep" | "glob" | "ls" | "listfiles"
            | "listdirectory" | "search" | "codesearch" | "websearch" | "webfetch" | "task"
            | "view" | "find" => Self::Read,
            "bash" | "bashoutput" | "killshell" | "shell" | "runcommand" | "execute" | "terminal" => {
                Self::Execute
            }
            "todowrite" | "todoread" | "exitplanmode" | "enterplanmode" | "updateplan" | "plan" => {
                Self::Plan
            }
            _ => Self::Other,
        }
    }

    /// Get the category name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Write => "write",
            Self::Read => "read",
            Self::Execute => "execute",
            Self::Plan => "plan",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check if a tool reads or searches.
#[must_use]
pub fn is_read_like(name: &str) -> bool {
    ToolCategory::of(name) == ToolCategory::Read
}

/// Check if a tool writes.
#[must_use]
pub fn is_write_like(name: &str) -> bool {
    ToolCategory::of(name) == ToolCategory::Write
}

/// Check if a tool performs a batched multi-location edit.
#[must_use]
pub fn is_multi_edit(name: &str) -> bool {
    normalize(name) == "multiedit"
}

/// Check if a tool creates whole files rather than editing them.
#[must_use]
pub fn is_file_creation(name: &str) -> bool {
    matches!(normalize(name).as_str(), "write" | "createfile" | "writefile")
}

/// Check if a tool edits existing files in place.
#[must_use]
pub fn is_in_place_edit(name: &str) -> bool {
    is_write_like(name) && !is_file_creation(name)
}

/// Check if a tool delegates work to a sub-agent.
#[must_use]
pub fn is_delegation(name: &str) -> bool {
    normalize(name) == "task"
}

/// Check if a tool is a manual code search (grep/glob style).
#[must_use]
pub fn is_manual_search(name: &str) -> bool {
    matches!(normalize(name).as_str(), "grep" | "glob" | "search" | "codesearch" | "find")
}

/// Check if a tool gives a structural overview (directory listings, globbing).
#[must_use]
pub fn is_structural_overview(name: &str) -> bool {
    matches!(
        normalize(name).as_str(),
        "ls" | "glob" | "listfiles" | "listdirectory" | "task"
    )
}

/// Check if a tool reads a single file's raw contents.
#[must_use]
pub fn is_raw_read(name: &str) -> bool {
    matches!(normalize(name).as_str(), "read" | "readfile" | "view" | "notebookread")
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
