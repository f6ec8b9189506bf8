//! Sessions command implementation.

use serde::Serialize;

use crate::cli::{Cli, OutputFormat, SessionsArgs};
use crate::config::Config;
use crate::error::Result;
use crate::model::Session;
use crate::storage::Storage;
use crate::util::truncate_chars;

use super::open_store;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionRow<'a> {
    id: &'a str,
    summary: &'a str,
    start_time: String,
    duration_minutes: f64,
    turns: usize,
    session_score: u8,
}

impl<'a> From<&'a Session> for SessionRow<'a> {
    fn from(s: &'a Session) -> Self {
        Self {
            id: &s.id,
            summary: &s.summary,
            start_time: s.start_time.to_rfc3339(),
            duration_minutes: s.duration_minutes,
            turns: s.turns.len(),
            session_score: s.metrics.session_score,
        }
    }
}

/// Run the sessions command.
pub fn run(cli: &Cli, config: &Config, args: &SessionsArgs) -> Result<()> {
    let store = open_store(cli, config)?;
    let sessions = store.list_sessions(args.limit, args.offset)?;

    match cli.effective_output() {
        OutputFormat::Json => {
            let rows: Vec<SessionRow<'_>> = sessions.iter().map(SessionRow::from).collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Text => {
            if sessions.is_empty() {
                if !cli.quiet {
                    println!("No stored sessions.");
                }
                return Ok(());
            }
            for s in &sessions {
                println!(
                    "{:<12} {}  {:>3}/100  {:>6.1} min  {}",
                    truncate_chars(&s.id, 12),
                    s.start_time.format("%Y-%m-%d %H:%M"),
                    s.metrics.session_score,
                    s.duration_minutes,
                    truncate_chars(&s.summary, 60)
                );
            }
        }
    }
    Ok(())
}
