//! Synthetic JSONL test data generators.
//!
//! Produces human/agent session logs in the wire format the parser reads, with
//! deterministic ids and timestamps so tests can assert on exact values.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Serialize;
use std::io::Write;

/// Configuration for generating synthetic sessions.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Number of exchanges (human + agent pairs).
    pub exchanges: usize,
    /// Include tool use segments in some agent turns.
    pub include_tools: bool,
    /// Average length of text content in characters.
    pub avg_text_length: usize,
    /// Session ID to use.
    pub session_id: String,
    /// Starting timestamp.
    pub start_time: DateTime<Utc>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            exchanges: 10,
            include_tools: true,
            avg_text_length: 120,
            session_id: "gen-0".to_string(),
            start_time: Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
        }
    }
}

impl SessionConfig {
    /// Create a minimal session config (small, fast generation).
    pub fn minimal() -> Self {
        Self {
            exchanges: 3,
            include_tools: false,
            avg_text_length: 40,
            ..Default::default()
        }
    }

    /// Create a large session config for stress testing.
    pub fn large() -> Self {
        Self {
            exchanges: 200,
            avg_text_length: 400,
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Record {
    kind: &'static str,
    id: String,
    parent_id: Option<String>,
    timestamp: String,
    session_id: String,
    turn: Turn,
}

#[derive(Debug, Serialize)]
struct Turn {
    role: &'static str,
    content: Content,
    #[serde(skip_serializing_if = "Option::is_none")]
    usage: Option<Usage>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Content {
    Text(String),
    Segments(Vec<Segment>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Segment {
    Text { text: String },
    ToolUse { id: String, name: String, input: serde_json::Value },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

/// Generate synthetic session data and write to a writer.
pub fn generate_session<W: Write>(config: &SessionConfig, writer: &mut W) -> std::io::Result<()> {
    let mut current_time = config.start_time;
    let mut parent_id: Option<String> = None;

    for idx in 0..config.exchanges {
        let human_id = format!("{}-h{idx}", config.session_id);
        let human = Record {
            kind: "human",
            id: human_id.clone(),
            parent_id: parent_id.clone(),
            timestamp: current_time.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            session_id: config.session_id.clone(),
            turn: Turn {
                role: "human",
                content: Content::Text(generate_human_text(idx, config.avg_text_length)),
                usage: None,
            },
        };
        writeln!(writer, "{}", serde_json::to_string(&human)?)?;
        parent_id = Some(human_id);
        current_time += Duration::seconds(30);

        let agent_id = format!("{}-a{idx}", config.session_id);
        let mut segments = vec![Segment::Text {
            text: generate_agent_text(idx, config.avg_text_length),
        }];
        if config.include_tools && idx % 2 == 1 {
            segments.push(Segment::ToolUse {
                id: format!("tool-{idx}"),
                name: tool_name(idx).to_string(),
                input: serde_json::json!({ "path": "src/lib.rs" }),
            });
        }
        let agent = Record {
            kind: "agent",
            id: agent_id.clone(),
            parent_id: parent_id.clone(),
            timestamp: current_time.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            session_id: config.session_id.clone(),
            turn: Turn {
                role: "agent",
                content: Content::Segments(segments),
                usage: Some(Usage {
                    input_tokens: idx as u64 * 50 + 100,
                    output_tokens: (config.avg_text_length / 4) as u64,
                }),
            },
        };
        writeln!(writer, "{}", serde_json::to_string(&agent)?)?;
        parent_id = Some(agent_id);
        current_time += Duration::seconds(90);
    }

    Ok(())
}

/// Generate one session as a string.
pub fn generate_jsonl(config: &SessionConfig) -> String {
    let mut buf = Vec::new();
    generate_session(config, &mut buf).expect("writing to a Vec cannot fail");
    String::from_utf8(buf).expect("generated JSON is UTF-8")
}

/// Generate `num_sessions` sessions named `gen-0`, `gen-1`, ..., one day apart.
pub fn generate_multi_session_jsonl(num_sessions: usize, exchanges_per_session: usize) -> String {
    let base = SessionConfig::default();
    let mut buf = Vec::new();
    for i in 0..num_sessions {
        let config = SessionConfig {
            exchanges: exchanges_per_session,
            session_id: format!("gen-{i}"),
            start_time: base.start_time + Duration::days(i as i64),
            ..base.clone()
        };
        generate_session(&config, &mut buf).expect("writing to a Vec cannot fail");
    }
    String::from_utf8(buf).expect("generated JSON is UTF-8")
}

fn generate_human_text(idx: usize, avg_length: usize) -> String {
    let templates = [
        "Can you explain how {} works?",
        "Please implement {} in src/lib.rs.",
        "There is an error when {}, can you fix it?",
        "Let's plan the work for {}.",
        "Run the tests to verify {}.",
        "Where is {} handled?",
    ];
    let topics = [
        "the session parser",
        "retry handling",
        "the cache eviction",
        "config loading",
        "the scoring function",
    ];

    let base = templates[idx % templates.len()].replace("{}", topics[idx % topics.len()]);
    if base.len() < avg_length {
        format!("{base} Context: {}", "relevant details ".repeat((avg_length - base.len()) / 18))
    } else {
        base
    }
}

fn generate_agent_text(idx: usize, avg_length: usize) -> String {
    let starters = [
        "Here is what I found.",
        "I made the change.",
        "The failure comes from a missing check.",
        "The plan has three steps.",
    ];
    let base = starters[idx % starters.len()].to_string();
    if base.len() < avg_length {
        let filler = "The module keeps its invariants. ";
        format!("{base} {}", filler.repeat((avg_length - base.len()) / filler.len() + 1))
    } else {
        base
    }
}

fn tool_name(idx: usize) -> &'static str {
    const TOOLS: [&str; 6] = ["Read", "Edit", "Grep", "Bash", "Write", "TodoWrite"];
    TOOLS[idx % TOOLS.len()]
}
