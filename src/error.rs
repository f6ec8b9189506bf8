//! Error types for turnscope.
//!
//! All fallible operations return [`Result`], built on a single `thiserror` enum.
//! Variants carry enough context for programmatic handling (line numbers, session
//! identifiers, sizes) and read well when displayed to a user.

use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for turnscope operations.
#[derive(Error, Debug)]
pub enum TurnscopeError {
    /// A log line was malformed or failed schema validation.
    #[error("Failed to parse record at line {line}: {message}")]
    ParseError {
        /// 1-based line number where parsing failed.
        line: usize,
        /// Human-readable error message.
        message: String,
        /// Underlying serde_json error, if available.
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Thread reconstruction was asked to build a session from zero records.
    #[error("Cannot reconstruct session {session_id}: no records")]
    EmptySession {
        /// Session identifier, or `<unknown>` when nothing was known.
        session_id: String,
    },

    /// Input exceeded the configured size ceiling before parsing began.
    #[error("Input size ({size} bytes) exceeds maximum ({limit} bytes)")]
    SizeLimit {
        /// Size of the rejected input in bytes.
        size: u64,
        /// Configured ceiling in bytes.
        limit: u64,
    },

    /// File not found.
    #[error("File not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Permission denied when accessing a file or directory.
    #[error("Permission denied: {path}")]
    PermissionDenied {
        /// Path where access was denied.
        path: PathBuf,
    },

    /// Storage collaborator failure.
    #[error("Storage error: {message}")]
    StorageError {
        /// Human-readable error message.
        message: String,
    },

    /// Insight generator collaborator failure.
    #[error("Insight generation failed for session {session_id}: {message}")]
    InsightError {
        /// Session the insight was requested for.
        session_id: String,
        /// Human-readable error message.
        message: String,
    },

    /// Profile aggregation could not be completed.
    #[error("Profile aggregation failed for user {user_id}: {message}")]
    AggregationError {
        /// User whose profile was being derived.
        user_id: String,
        /// Human-readable error message.
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Human-readable error message.
        message: String,
    },

    /// Invalid configuration file contents.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Human-readable error message.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {context}")]
    IoError {
        /// Context describing the operation that failed.
        context: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Serialization error.
    #[error("Serialization error: {context}")]
    SerializationError {
        /// Context describing the operation that failed.
        context: String,
        /// Underlying serde_json error.
        #[source]
        source: serde_json::Error,
    },

    /// Unsupported operation or platform feature.
    #[error("Unsupported: {feature}")]
    Unsupported {
        /// Name of the unsupported feature.
        feature: String,
    },

    /// Invalid argument.
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument {
        /// Name of the invalid argument.
        name: String,
        /// Reason why the argument is invalid.
        reason: String,
    },
}

impl TurnscopeError {
    /// Create a new parse error.
    #[must_use]
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            line,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new parse error with source.
    #[must_use]
    pub fn parse_with_source(line: usize, message: impl Into<String>, source: serde_json::Error) -> Self {
        Self::ParseError {
            line,
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a new I/O error with context.
    #[must_use]
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoError {
            context: context.into(),
            source,
        }
    }

    /// Create a new storage error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageError {
            message: message.into(),
        }
    }

    /// Create a new aggregation error.
    #[must_use]
    pub fn aggregation(user_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AggregationError {
            user_id: user_id.into(),
            message: message.into(),
        }
    }

    /// Get the process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::ParseError { .. } | Self::SizeLimit { .. } => exit_codes::EXIT_PARSE_ERROR,
            Self::FileNotFound { .. } => exit_codes::EXIT_FILE_NOT_FOUND,
            Self::PermissionDenied { .. } => exit_codes::EXIT_PERMISSION_DENIED,
            Self::ConfigError { .. } | Self::InvalidConfig { .. } => exit_codes::EXIT_CONFIG_ERROR,
            Self::EmptySession { .. } => exit_codes::EXIT_DATA_ERROR,
            Self::InvalidArgument { .. } => exit_codes::EXIT_USAGE_ERROR,
            Self::IoError { .. } => exit_codes::EXIT_IO_ERROR,
            _ => exit_codes::EXIT_GENERAL_ERROR,
        }
    }

    /// Check if this error only affects one line or one session of a batch.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ParseError { .. } | Self::EmptySession { .. } | Self::InsightError { .. }
        )
    }
}

/// Result type alias for turnscope operations.
pub type Result<T> = std::result::Result<T, TurnscopeError>;

impl From<std::io::Error> for TurnscopeError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            context: "I/O operation failed".to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for TurnscopeError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError {
            context: "JSON operation failed".to_string(),
            source: err,
        }
    }
}

/// Exit codes for CLI operations.
pub mod exit_codes {
    /// General/unspecified error.
    pub const EXIT_GENERAL_ERROR: i32 = 1;
    /// Log parsing failed.
    pub const EXIT_PARSE_ERROR: i32 = 2;
    /// Specified file not found.
    pub const EXIT_FILE_NOT_FOUND: i32 = 3;
    /// Insufficient permissions.
    pub const EXIT_PERMISSION_DENIED: i32 = 4;
    /// Invalid configuration.
    pub const EXIT_CONFIG_ERROR: i32 = 5;
    /// Invalid command-line usage (BSD standard).
    pub const EXIT_USAGE_ERROR: i32 = 64;
    /// Input data format error (BSD standard).
    pub const EXIT_DATA_ERROR: i32 = 65;
    /// I/O error (BSD standard).
    pub const EXIT_IO_ERROR: i32 = 74;
}
