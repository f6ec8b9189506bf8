//! CLI command implementations.
//!
//! Each command is implemented in its own module with a `run` function
//! that handles the command logic.

pub mod analyze;
pub mod profile;
pub mod prune;
pub mod sessions;
pub mod validate;

use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;
use crate::storage::JsonFileStore;

/// Open the JSON store from `--data-dir`, the config, or the platform default.
pub fn open_store(cli: &Cli, config: &Config) -> Result<JsonFileStore> {
    let root = match &cli.data_dir {
        Some(dir) => dir.clone(),
        None => config.storage_dir()?,
    };
    JsonFileStore::open(root)
}
