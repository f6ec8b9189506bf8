//! Newline-delimited JSON parsing for agent session logs.
//!
//! Each non-blank line holds one [`LogRecord`]. Lines are decoded independently
//! with `serde_json` and then checked against the invariants serde cannot express
//! (non-empty identifiers).
//!
//! # Example
//!
//! ```rust,no_run
//! use turnscope::parser::RecordParser;
//!
//! let mut parser = RecordParser::new().with_strict(false);
//! let sessions = parser.group_by_session(&std::fs::read_to_string("session.jsonl")?)?;
//! println!("{} sessions, {:.1}% lines ok", sessions.len(), parser.stats().success_rate());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Parsing Modes
//!
//! - **Strict mode** (default): fails on the first malformed line with a 1-based line number
//! - **Lenient mode**: skips malformed lines and records them in [`ParseStats`]

use std::fs::File;
use std::io::Read;
use std::path::Path;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, instrument, trace, warn};

use crate::config::{ParserConfig, DEFAULT_MAX_INPUT_BYTES};
use crate::error::{Result, TurnscopeError};
use crate::model::LogRecord;
use crate::util::{format_bytes, truncate_preview};

/// Record parser for session logs.
#[derive(Debug)]
pub struct RecordParser {
    /// Whether to fail on the first malformed line.
    strict: bool,
    /// Maximum input size in bytes (0 = unlimited).
    max_size: u64,
    /// Statistics about the last parse.
    stats: ParseStats,
}

/// Statistics about parsing operations.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseStats {
    /// Total lines processed.
    pub lines_processed: usize,
    /// Successfully parsed records.
    pub records_parsed: usize,
    /// Malformed or invalid lines that were skipped.
    pub lines_skipped: usize,
    /// Blank lines.
    pub empty_lines: usize,
    /// Issues encountered in lenient mode.
    pub issues: Vec<ParseIssue>,
}

impl ParseStats {
    /// Calculate success rate as percentage of non-blank lines.
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        let valid = self.lines_processed - self.empty_lines;
        if valid == 0 {
            return 100.0;
        }
        (self.records_parsed as f64 / valid as f64) * 100.0
    }
}

/// A skipped line with context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseIssue {
    /// 1-based line number.
    pub line: usize,
    /// Error message.
    pub message: String,
    /// Original line content (truncated).
    pub content_preview: String,
}

impl RecordParser {
    /// Create a strict parser with the default size ceiling.
    #[must_use]
    pub fn new() -> Self {
        Self {
            strict: true,
            max_size: DEFAULT_MAX_INPUT_BYTES,
            stats: ParseStats::default(),
        }
    }

    /// Create a parser from configuration.
    #[must_use]
    pub fn from_config(config: &ParserConfig) -> Self {
        Self::new()
            .with_strict(config.strict)
            .with_max_size(config.max_input_bytes)
    }

    /// Set strict mode (fail on the first malformed line).
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set maximum input size in bytes (0 = unlimited).
    #[must_use]
    pub fn with_max_size(mut self, max_bytes: u64) -> Self {
        self.max_size = max_bytes;
        self
    }

    /// Get statistics about the last parse.
    #[must_use]
    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    /// Parse a log file from a path.
    ///
    /// The file size is checked against the ceiling before anything is read.
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn parse_file(&mut self, path: impl AsRef<Path>) -> Result<Vec<LogRecord>> {
        let content = self.read_file(path.as_ref())?;
        self.parse_str(&content)
    }

    /// Parse a log file and group its records by session.
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn group_file(&mut self, path: impl AsRef<Path>) -> Result<IndexMap<String, Vec<LogRecord>>> {
        let content = self.read_file(path.as_ref())?;
        self.group_by_session(&content)
    }

    fn read_file(&self, path: &Path) -> Result<String> {
        debug!("Opening file for parsing");

        let mut file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => TurnscopeError::FileNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => TurnscopeError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => TurnscopeError::io(format!("Failed to open {}", path.display()), e),
        })?;

        if self.max_size > 0 {
            let metadata = file.metadata().map_err(|e| {
                TurnscopeError::io(format!("Failed to get metadata for {}", path.display()), e)
            })?;
            let file_size = metadata.len();
            trace!(file_size, max_size = self.max_size, "Checking file size limit");
            self.check_size(file_size)?;
        }

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| TurnscopeError::io(format!("Failed to read {}", path.display()), e))?;
        Ok(content)
    }

    fn check_size(&self, size: u64) -> Result<()> {
        if self.max_size > 0 && size > self.max_size {
            debug!(
                size = %format_bytes(size),
                limit = %format_bytes(self.max_size),
                "Input exceeds size limit"
            );
            return Err(TurnscopeError::SizeLimit {
                size,
                limit: self.max_size,
            });
        }
        Ok(())
    }

    /// Parse newline-delimited records from a string.
    ///
    /// Records are returned in input order. Blank lines are skipped.
    #[instrument(skip(self, content), fields(bytes = content.len()), level = "debug")]
    pub fn parse_str(&mut self, content: &str) -> Result<Vec<LogRecord>> {
        self.stats = ParseStats::default();
        self.check_size(content.len() as u64)?;

        let mut records = Vec::new();

        for (idx, line) in content.lines().enumerate() {
            let line_num = idx + 1;
            self.stats.lines_processed += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                self.stats.empty_lines += 1;
                continue;
            }

            match Self::parse_line(trimmed, line_num) {
                Ok(record) => {
                    self.stats.records_parsed += 1;
                    records.push(record);
                }
                Err(e) => {
                    if self.strict {
                        warn!(line = line_num, error = %e, "Malformed record");
                        return Err(e);
                    }
                    self.stats.lines_skipped += 1;
                    self.stats.issues.push(ParseIssue {
                        line: line_num,
                        message: e.to_string(),
                        content_preview: truncate_preview(trimmed, 100),
                    });
                    trace!(line = line_num, error = %e, "Parse error, skipping line");
                }
            }
        }

        debug!(
            records = records.len(),
            lines = self.stats.lines_processed,
            skipped = self.stats.lines_skipped,
            "Parsing complete"
        );
        Ok(records)
    }

    /// Parse and group records by session.
    ///
    /// Sessions keep the order in which they first appear; records within a session
    /// are sorted by timestamp, ties keeping input order.
    pub fn group_by_session(&mut self, content: &str) -> Result<IndexMap<String, Vec<LogRecord>>> {
        let records = self.parse_str(content)?;
        Ok(group_records(records))
    }

    /// Parse a single record line.
    pub fn parse_line(line: &str, line_num: usize) -> Result<LogRecord> {
        let record: LogRecord = serde_json::from_str(line)
            .map_err(|e| TurnscopeError::parse_with_source(line_num, e.to_string(), e))?;
        record.validate(line_num)?;
        Ok(record)
    }
}

impl Default for RecordParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Group already-parsed records by session.
#[must_use]
pub fn group_records(records: Vec<LogRecord>) -> IndexMap<String, Vec<LogRecord>> {
    let mut sessions: IndexMap<String, Vec<LogRecord>> = IndexMap::new();
    for record in records {
        sessions.entry(record.session_id.clone()).or_default().push(record);
    }
    for bucket in sessions.values_mut() {
        // Vec::sort_by_key is stable.
        bucket.sort_by_key(|r| r.timestamp);
    }
    sessions
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn line(id: &str, session: &str, ts: &str) -> String {
        format!(
            r#"{{"kind":"human","id":"{id}","parentId":null,"timestamp":"{ts}","sessionId":"{session}","turn":{{"role":"human","content":"hi"}}}}"#
        )
    }

    #[test]
    fn test_parse_empty() {
        let mut parser = RecordParser::new();
        let records = parser.parse_str("").unwrap();
        assert!(records.is_empty());
        assert!((parser.stats().success_rate() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let content = format!("\n{}\n   \n{}\n", line("a", "s", "2025-01-01T00:00:00Z"), line("b", "s", "2025-01-01T00:01:00Z"));
        let mut parser = RecordParser::new();
        let records = parser.parse_str(&content).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(parser.stats().empty_lines, 2);
    }

    #[test]
    fn test_strict_reports_line_number() {
        let content = format!(
            "{}\n{}\n{{not json\n",
            line("a", "s", "2025-01-01T00:00:00Z"),
            line("b", "s", "2025-01-01T00:01:00Z")
        );
        let err = RecordParser::new().parse_str(&content).unwrap_err();
        assert!(matches!(err, TurnscopeError::ParseError { line: 3, .. }));
    }

    #[test]
    fn test_lenient_parsing() {
        let content = format!(
            "{}\ninvalid json line\n{}",
            line("a", "s", "2025-01-01T00:00:00Z"),
            line("b", "s", "2025-01-01T00:01:00Z")
        );
        let mut parser = RecordParser::new().with_strict(false);
        let records = parser.parse_str(&content).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(parser.stats().lines_skipped, 1);
        assert_eq!(parser.stats().issues[0].line, 2);
        assert_eq!(parser.stats().issues[0].content_preview, "invalid json line");
    }

    #[test]
    fn test_empty_session_id_rejected() {
        let bad = line("a", "", "2025-01-01T00:00:00Z");
        let err = RecordParser::new().parse_str(&bad).unwrap_err();
        assert!(matches!(err, TurnscopeError::ParseError { line: 1, .. }));
    }

    #[test]
    fn test_bad_timestamp_rejected() {
        let bad = line("a", "s", "not-a-time");
        assert!(RecordParser::new().parse_str(&bad).is_err());
    }

    #[test]
    fn test_size_limit() {
        let content = line("a", "s", "2025-01-01T00:00:00Z");
        let err = RecordParser::new().with_max_size(10).parse_str(&content).unwrap_err();
        assert!(matches!(err, TurnscopeError::SizeLimit { limit: 10, .. }));

        let ok = RecordParser::new().with_max_size(0).parse_str(&content).unwrap();
        assert_eq!(ok.len(), 1);
    }

    #[test]
    fn test_grouping_order_and_sort() {
        let content = [
            line("b2", "B", "2025-01-01T00:05:00Z"),
            line("a2", "A", "2025-01-01T00:03:00Z"),
            line("a1", "A", "2025-01-01T00:01:00Z"),
            line("b1", "B", "2025-01-01T00:02:00Z"),
            line("a3", "A", "2025-01-01T00:03:00Z"),
        ]
        .join("\n");

        let groups = RecordParser::new().group_by_session(&content).unwrap();
        let keys: Vec<_> = groups.keys().cloned().collect();
        assert_eq!(keys, vec!["B".to_string(), "A".to_string()]);

        let a_ids: Vec<_> = groups["A"].iter().map(|r| r.id.as_str()).collect();
        assert_eq!(a_ids, vec!["a1", "a2", "a3"]);
    }

    #[test]
    fn test_parse_file_not_found() {
        let err = RecordParser::new()
            .parse_file("/nonexistent/session.jsonl")
            .unwrap_err();
        assert!(matches!(err, TurnscopeError::FileNotFound { .. }));
    }

    #[test]
    fn test_parse_file_size_checked_before_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.jsonl");
        std::fs::write(&path, "x".repeat(64)).unwrap();

        let err = RecordParser::new().with_max_size(16).parse_file(&path).unwrap_err();
        assert!(matches!(err, TurnscopeError::SizeLimit { size: 64, limit: 16 }));
    }
}
