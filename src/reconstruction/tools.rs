//! Per-turn tool extraction.
//!
//! Structured invocations come from `tool_use` segments and from the opaque
//! `toolResult` payload; they keep duplicates. Tool mentions found in the turn text
//! are unioned in afterwards.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::model::{LogRecord, KNOWN_TOOLS};

/// Field names that carry a tool name inside a tool result payload.
const PAYLOAD_NAME_FIELDS: &[&str] = &["toolName", "tool_name", "name", "tool"];

static BRACKET_MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[Tool:\s*([A-Za-z_][\w\-]*)\s*\]").unwrap());

static USING_MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\busing the ([A-Za-z_][\w\-]*) tool\b").unwrap());

static TAG_MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<tool_use\s+name="([^"]+)""#).unwrap());

static CALL_MENTION: Lazy<Regex> = Lazy::new(|| {
    let names: Vec<String> = KNOWN_TOOLS.iter().map(|t| regex::escape(t)).collect();
    Regex::new(&format!(r"\b({})\(", names.join("|"))).unwrap()
});

static SYSTEM_REMINDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<system-reminder>.*?(</system-reminder>|$)").unwrap());

/// Tool names invoked by a record.
#[must_use]
pub fn extract_tools(record: &LogRecord) -> Vec<String> {
    let mut tools: Vec<String> = record
        .turn
        .content
        .tool_use_names()
        .into_iter()
        .map(String::from)
        .collect();

    if let Some(payload) = &record.tool_result {
        collect_payload_tools(payload, &mut tools);
    }

    for mention in mentioned_tools(&record.text()) {
        if !tools.contains(&mention) {
            tools.push(mention);
        }
    }

    tools
}

/// Collect tool names from an opaque tool result payload.
pub fn collect_payload_tools(payload: &Value, out: &mut Vec<String>) {
    match payload {
        Value::Array(items) => {
            for item in items {
                collect_payload_tools(item, out);
            }
        }
        Value::Object(map) => {
            for field in PAYLOAD_NAME_FIELDS {
                if let Some(Value::String(name)) = map.get(*field) {
                    if !name.is_empty() {
                        out.push(name.clone());
                    }
                }
            }
            if let Some(Value::Array(items)) = map.get("tools") {
                for item in items {
                    match item {
                        Value::String(name) if !name.is_empty() => out.push(name.clone()),
                        other => collect_payload_tools(other, out),
                    }
                }
            }
        }
        _ => {}
    }
}

/// Tool names mentioned in free text, deduplicated, in pattern order.
#[must_use]
pub fn mentioned_tools(text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for pattern in [&*BRACKET_MENTION, &*USING_MENTION, &*TAG_MENTION, &*CALL_MENTION] {
        for caps in pattern.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                let name = m.as_str().to_string();
                if !found.contains(&name) {
                    found.push(name);
                }
            }
        }
    }
    found
}

/// Check if a turn's text is harness noise rather than something a person wrote.
///
/// Interrupt markers, `System:` messages, text consisting only of
/// `<system-reminder>` blocks, and command-style prompts carrying the `ultrathink`
/// keyword or the `--use-todos` flag all count.
#[must_use]
pub fn is_noise_text(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }
    if trimmed.starts_with("[Request interrupted")
        || trimmed.contains("[Request interrupted by user]")
        || trimmed.starts_with("System:")
    {
        return true;
    }
    if trimmed.contains("--use-todos") || trimmed.to_lowercase().contains("ultrathink") {
        return true;
    }
    trimmed.contains("<system-reminder>") && SYSTEM_REMINDER.replace_all(trimmed, "").trim().is_empty()
}
