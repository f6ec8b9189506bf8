//! Configuration management for turnscope.
//!
//! Handles:
//! - Parser strictness and input size ceiling
//! - Classifier thresholds
//! - Storage location and retention
//! - Profile derivation thresholds

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TurnscopeError};
use crate::util::atomic_write;

/// Default input size ceiling: 50 MB.
pub const DEFAULT_MAX_INPUT_BYTES: u64 = 50 * 1024 * 1024;

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Record parser settings.
    #[serde(default)]
    pub parser: ParserConfig,
    /// Activity classifier settings.
    #[serde(default)]
    pub classifier: ClassifierConfig,
    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Profile aggregation settings.
    #[serde(default)]
    pub profile: ProfileConfig,
}

impl Config {
    /// Load configuration from the default location, or defaults if there is none.
    pub fn load() -> Result<Self> {
        let config_path = default_config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TurnscopeError::ConfigError {
                    message: format!("Config file not found: {}", path.display()),
                }
            } else {
                TurnscopeError::io(format!("Failed to read config file: {}", path.display()), e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| TurnscopeError::InvalidConfig {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Merge another config into this one (other takes precedence where it differs
    /// from the defaults).
    pub fn merge_from(&mut self, other: &Config) {
        let defaults = Config::default();

        if other.parser.strict != defaults.parser.strict {
            self.parser.strict = other.parser.strict;
        }
        if other.parser.max_input_bytes != defaults.parser.max_input_bytes {
            self.parser.max_input_bytes = other.parser.max_input_bytes;
        }

        if other.classifier.restart_gap_minutes != defaults.classifier.restart_gap_minutes {
            self.classifier.restart_gap_minutes = other.classifier.restart_gap_minutes;
        }
        if (other.classifier.pivot_similarity_threshold - defaults.classifier.pivot_similarity_threshold).abs()
            > f64::EPSILON
        {
            self.classifier.pivot_similarity_threshold = other.classifier.pivot_similarity_threshold;
        }
        if other.classifier.deep_dive_read_threshold != defaults.classifier.deep_dive_read_threshold {
            self.classifier.deep_dive_read_threshold = other.classifier.deep_dive_read_threshold;
        }

        if other.storage.directory.is_some() {
            self.storage.directory = other.storage.directory.clone();
        }
        if other.storage.retention_days.is_some() {
            self.storage.retention_days = other.storage.retention_days;
        }

        if (other.profile.min_strength_confidence - defaults.profile.min_strength_confidence).abs()
            > f64::EPSILON
        {
            self.profile.min_strength_confidence = other.profile.min_strength_confidence;
        }
        if other.profile.recent_window_days != defaults.profile.recent_window_days {
            self.profile.recent_window_days = other.profile.recent_window_days;
        }
    }

    /// Check value ranges serde cannot express.
    pub fn validate(&self) -> Result<()> {
        let threshold = self.classifier.pivot_similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(TurnscopeError::InvalidConfig {
                message: format!("classifier.pivot_similarity_threshold must be within [0, 1], got {threshold}"),
            });
        }
        let confidence = self.profile.min_strength_confidence;
        if !(0.0..=100.0).contains(&confidence) {
            return Err(TurnscopeError::InvalidConfig {
                message: format!("profile.min_strength_confidence must be within [0, 100], got {confidence}"),
            });
        }
        if self.profile.recent_window_days == 0 {
            return Err(TurnscopeError::InvalidConfig {
                message: "profile.recent_window_days must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Save configuration to a specific path, atomically.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| TurnscopeError::InvalidConfig {
            message: format!("Failed to serialize config: {e}"),
        })?;

        atomic_write(path, content.as_bytes())?;

        Ok(())
    }

    /// Resolve the storage directory, falling back to the platform data directory.
    pub fn storage_dir(&self) -> Result<PathBuf> {
        match &self.storage.directory {
            Some(dir) => Ok(dir.clone()),
            None => default_data_dir(),
        }
    }
}

/// Record parser configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Fail on the first malformed line.
    #[serde(default = "default_true")]
    pub strict: bool,
    /// Input size ceiling in bytes (0 = unlimited).
    #[serde(default = "default_max_input_bytes")]
    pub max_input_bytes: u64,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            strict: true,
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
        }
    }
}

/// Activity classifier configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Minutes of silence after which a human turn counts as a fresh start.
    #[serde(default = "default_restart_gap")]
    pub restart_gap_minutes: i64,
    /// Jaccard similarity below which a human turn counts as a pivot.
    #[serde(default = "default_pivot_threshold")]
    pub pivot_similarity_threshold: f64,
    /// Read-like tool invocations above which a turn counts as a deep dive.
    #[serde(default = "default_deep_dive_reads")]
    pub deep_dive_read_threshold: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            restart_gap_minutes: 15,
            pivot_similarity_threshold: 0.3,
            deep_dive_read_threshold: 3,
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage directory (defaults to the platform data directory).
    #[serde(default)]
    pub directory: Option<PathBuf>,
    /// Default age in days for `prune`.
    #[serde(default)]
    pub retention_days: Option<u32>,
}

/// Profile aggregation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Strengths below this confidence are dropped.
    #[serde(default = "default_min_confidence")]
    pub min_strength_confidence: f64,
    /// Window for weekly progress, in days.
    #[serde(default = "default_recent_window")]
    pub recent_window_days: u32,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            min_strength_confidence: 40.0,
            recent_window_days: 7,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_input_bytes() -> u64 {
    DEFAULT_MAX_INPUT_BYTES
}

fn default_restart_gap() -> i64 {
    15
}

fn default_pivot_threshold() -> f64 {
    0.3
}

fn default_deep_dive_reads() -> usize {
    3
}

fn default_min_confidence() -> f64 {
    40.0
}

fn default_recent_window() -> u32 {
    7
}

/// Get the default configuration path.
pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| TurnscopeError::Unsupported {
        feature: "config directory discovery".to_string(),
    })?;

    Ok(config_dir.join("turnscope").join("config.toml"))
}

/// Get the default data directory.
pub fn default_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().ok_or_else(|| TurnscopeError::Unsupported {
        feature: "data directory discovery".to_string(),
    })?;

    Ok(data_dir.join("turnscope"))
}
