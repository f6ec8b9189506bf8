//! Prune command implementation.

use crate::cli::{Cli, OutputFormat, PruneArgs};
use crate::config::Config;
use crate::error::{Result, TurnscopeError};
use crate::storage::Storage;

use super::open_store;

/// Run the prune command.
pub fn run(cli: &Cli, config: &Config, args: &PruneArgs) -> Result<()> {
    let days = args
        .older_than
        .or(config.storage.retention_days)
        .ok_or_else(|| TurnscopeError::InvalidArgument {
            name: "older-than".to_string(),
            reason: "pass --older-than or set storage.retention_days".to_string(),
        })?;

    let store = open_store(cli, config)?;
    let deleted = store.delete_older_than(days)?;

    match cli.effective_output() {
        OutputFormat::Json => println!("{}", serde_json::json!({ "deleted": deleted, "olderThanDays": days })),
        OutputFormat::Text => {
            if !cli.quiet {
                println!("Deleted {deleted} session(s) older than {days} day(s).");
            }
        }
    }
    Ok(())
}
