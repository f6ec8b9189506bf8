//! Property-based tests for parsing, classification and scoring.
//!
//! Uses proptest to fuzz the parser with arbitrary input and the analysis
//! stages with generated sessions, checking that bounds and counts always hold.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use turnscope::classify::{jaccard_similarity, ActivityClassifier};
use turnscope::metrics::{score_prompt, MetricsEngine};
use turnscope::model::{ProcessedTurn, Role, Session};
use turnscope::parser::{group_records, RecordParser};

/// One generated record line.
fn record_line(session: &str, id: usize, human: bool, minute: i64, text: &str) -> String {
    let base = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
    serde_json::json!({
        "kind": if human { "human" } else { "agent" },
        "id": format!("r{id}"),
        "parentId": if id == 0 { None } else { Some(format!("r{}", id - 1)) },
        "timestamp": (base + Duration::minutes(minute)).to_rfc3339(),
        "sessionId": session,
        "turn": {
            "role": if human { "human" } else { "agent" },
            "content": text,
            "usage": { "inputTokens": 10, "outputTokens": 5 },
        },
    })
    .to_string()
}

fn arb_turns() -> impl Strategy<Value = Vec<(bool, u8, String)>> {
    prop::collection::vec((any::<bool>(), 0u8..30, "[a-z ?.`]{0,80}"), 1..30)
}

fn session_from(turns: &[(bool, u8, String)]) -> Session {
    let base = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
    let mut minute = 0i64;
    let turns: Vec<ProcessedTurn> = turns
        .iter()
        .enumerate()
        .map(|(i, (human, gap, text))| {
            minute += i64::from(*gap);
            let role = if *human { Role::Human } else { Role::Agent };
            ProcessedTurn::new(format!("t{i}"), role, text.clone(), base + Duration::minutes(minute))
        })
        .collect();
    let end = turns.last().map_or(base, |t| t.timestamp);
    Session {
        id: "prop".to_string(),
        summary: "prop".to_string(),
        duration_minutes: (end - base).num_milliseconds() as f64 / 60_000.0,
        turns,
        metrics: Default::default(),
        start_time: base,
        end_time: end,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Parser should never panic on arbitrary byte input.
    #[test]
    fn parser_never_panics_on_arbitrary_bytes(bytes in prop::collection::vec(any::<u8>(), 0..10000)) {
        let content = String::from_utf8_lossy(&bytes);
        let mut parser = RecordParser::new().with_strict(false);
        let _ = parser.parse_str(&content);
    }

    /// Lenient parsing of arbitrary lines always succeeds.
    #[test]
    fn lenient_parser_accepts_garbage(lines in prop::collection::vec(".*", 0..100)) {
        let content = lines.join("\n");
        let mut parser = RecordParser::new().with_strict(false);
        prop_assert!(parser.parse_str(&content).is_ok());
    }

    /// Parser stats should be consistent.
    #[test]
    fn parser_stats_are_consistent(lines in prop::collection::vec("[^\n]*", 1..50)) {
        let content = lines.join("\n");
        let mut parser = RecordParser::new().with_strict(false);
        let records = parser.parse_str(&content).unwrap();

        let stats = parser.stats();
        prop_assert_eq!(records.len(), stats.records_parsed);
        prop_assert_eq!(stats.issues.len(), stats.lines_skipped);
        prop_assert_eq!(
            stats.lines_processed,
            stats.records_parsed + stats.lines_skipped + stats.empty_lines,
            "Stats don't add up: processed={}, parsed={}, skipped={}, empty={}",
            stats.lines_processed,
            stats.records_parsed,
            stats.lines_skipped,
            stats.empty_lines
        );
    }

    /// Strict parsing rejects any non-blank line without JSON structure.
    #[test]
    fn strict_parser_rejects_invalid_json(content in "[^{}\\[\\]\"\n]+") {
        if content.trim().is_empty() {
            return Ok(());
        }
        let mut parser = RecordParser::new();
        prop_assert!(parser.parse_str(&content).is_err());
    }

    /// Valid records survive interleaved garbage, and parsing is repeatable.
    #[test]
    fn valid_records_survive_garbage(
        texts in prop::collection::vec("[a-zA-Z0-9 ]{0,40}", 1..20),
        garbage in prop::collection::vec("[a-z]{1,10}", 0..10),
    ) {
        let mut lines: Vec<String> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| record_line("s", i, i % 2 == 0, i as i64, t))
            .collect();
        for (i, g) in garbage.iter().enumerate() {
            lines.insert((i * 3).min(lines.len()), g.clone());
        }
        let content = lines.join("\n");

        let mut parser = RecordParser::new().with_strict(false);
        let first = parser.parse_str(&content).unwrap();
        let second = parser.parse_str(&content).unwrap();

        prop_assert_eq!(first.len(), texts.len());
        prop_assert_eq!(parser.stats().lines_skipped, garbage.len());
        prop_assert_eq!(first, second);
    }

    /// Grouping keeps every record and never mixes sessions.
    #[test]
    fn grouping_partitions_records(sessions in prop::collection::vec(0usize..5, 1..60)) {
        let content: String = sessions
            .iter()
            .enumerate()
            .map(|(i, s)| record_line(&format!("s{s}"), i, true, i as i64, "hi"))
            .collect::<Vec<_>>()
            .join("\n");

        let mut parser = RecordParser::new();
        let records = parser.parse_str(&content).unwrap();
        let groups = group_records(records);

        prop_assert_eq!(groups.values().map(Vec::len).sum::<usize>(), sessions.len());
        for (id, records) in &groups {
            prop_assert!(records.iter().all(|r| &r.session_id == id));
            prop_assert!(records.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        }
    }

    /// Success rate should be between 0 and 100.
    #[test]
    fn success_rate_bounds(lines in prop::collection::vec(".*", 0..50)) {
        let content = lines.join("\n");
        let mut parser = RecordParser::new().with_strict(false);
        let _ = parser.parse_str(&content);

        let rate = parser.stats().success_rate();
        prop_assert!((0.0..=100.0).contains(&rate), "Rate out of bounds: {}", rate);
    }

    /// Every turn gets a label, and pre-set labels are never overwritten.
    #[test]
    fn classifier_labels_every_turn(turns in arb_turns()) {
        let mut session = session_from(&turns);
        ActivityClassifier::new().classify_session(&mut session.turns);
        prop_assert!(session.turns.iter().all(|t| t.activity.is_some()));

        let before: Vec<_> = session.turns.iter().map(|t| t.activity).collect();
        ActivityClassifier::new().classify_session(&mut session.turns);
        let after: Vec<_> = session.turns.iter().map(|t| t.activity).collect();
        prop_assert_eq!(before, after);
    }

    /// Prompt quality stays in range, and agent turns score zero.
    #[test]
    fn prompt_quality_bounds(text in ".{0,600}") {
        let human = ProcessedTurn::new("h", Role::Human, text.clone(), Utc::now());
        prop_assert!(score_prompt(&human) <= 100);

        let agent = ProcessedTurn::new("a", Role::Agent, text, Utc::now());
        prop_assert_eq!(score_prompt(&agent), 0);
    }

    /// All scores stay within [0, 100] and counters match the turns.
    #[test]
    fn session_scores_are_bounded(turns in arb_turns()) {
        let mut session = session_from(&turns);
        ActivityClassifier::new().classify_session(&mut session.turns);
        MetricsEngine::new().annotate(&mut session);

        let m = &session.metrics;
        prop_assert!(m.session_score <= 100);
        prop_assert_eq!(m.human_turns + m.agent_turns, session.turns.len());
        prop_assert_eq!(m.activity_distribution.values().sum::<usize>(), m.human_turns);
        for value in [
            m.score_breakdown.efficiency,
            m.score_breakdown.quality,
            m.score_breakdown.progression,
            m.score_breakdown.tool_mastery,
        ] {
            prop_assert!((0.0..=100.0).contains(&value), "{} out of range", value);
        }
    }

    /// Jaccard similarity is symmetric and bounded.
    #[test]
    fn jaccard_is_symmetric(a in "[a-c ]{0,20}", b in "[a-c ]{0,20}") {
        let ab = jaccard_similarity(&a, &b);
        prop_assert!((0.0..=1.0).contains(&ab));
        prop_assert!((ab - jaccard_similarity(&b, &a)).abs() < 1e-12);
    }
}

/// Tests for specific edge cases discovered through fuzzing.
mod edge_cases {
    use super::*;

    #[test]
    fn null_bytes_in_content() {
        let mut parser = RecordParser::new().with_strict(false);
        assert!(parser.parse_str("hello\0world").is_ok());
    }

    #[test]
    fn unicode_edge_cases() {
        let cases = [
            "\u{FEFF}",
            "\u{200B}",
            "\u{FFFD}",
            "\u{1F980}",
            "\u{65E5}\u{672C}\u{8A9E}",
            "\u{1F600}\u{1F601}\u{1F602}",
        ];

        for content in cases {
            let mut parser = RecordParser::new().with_strict(false);
            assert!(parser.parse_str(content).is_ok(), "Failed on: {:?}", content);
        }
    }

    #[test]
    fn record_missing_session_id_is_skipped() {
        let line = r#"{"kind":"human","id":"x","timestamp":"2025-03-01T09:00:00Z","sessionId":"","turn":{"role":"human","content":"hi"}}"#;
        let mut parser = RecordParser::new().with_strict(false);
        assert!(parser.parse_str(line).unwrap().is_empty());
        assert_eq!(parser.stats().lines_skipped, 1);
    }

    #[test]
    fn null_content_is_rejected() {
        let line = r#"{"kind":"human","id":"x","timestamp":"2025-03-01T09:00:00Z","sessionId":"s","turn":{"role":"human","content":null}}"#;
        let mut parser = RecordParser::new();
        assert!(parser.parse_str(line).is_err());
    }

    #[test]
    fn naive_timestamp_is_utc() {
        let line = r#"{"kind":"human","id":"x","timestamp":"2025-03-01T09:00:00","sessionId":"s","turn":{"role":"human","content":"hi"}}"#;
        let records = RecordParser::new().parse_str(line).unwrap();
        assert_eq!(records[0].timestamp, Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap());
    }

    #[test]
    fn many_empty_lines() {
        let content = "\n".repeat(10_000);
        let mut parser = RecordParser::new().with_strict(false);
        assert!(parser.parse_str(&content).is_ok());
        assert_eq!(parser.stats().empty_lines, 10_000);
    }
}
