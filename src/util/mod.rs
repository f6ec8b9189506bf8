//! Utility functions shared across the crate.
//!
//! - Atomic file writes for storage and configuration
//! - Character-aware truncation for previews and summaries
//! - Byte formatting for size-limit messages
//! - File-name sanitization for storage keys

use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::{Result, TurnscopeError};

/// Atomically write content to a file.
///
/// The content is written to a temporary file in the target's directory, flushed,
/// then renamed over the target. If any step fails the original file, if any, is
/// left unchanged. Missing parent directories are created.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created, or if writing or
/// persisting the temporary file fails.
///
/// # Example
///
/// ```rust,no_run
/// use turnscope::util::atomic_write;
///
/// atomic_write("config.toml", b"[parser]\nstrict = true\n").unwrap();
/// ```
pub fn atomic_write(path: impl AsRef<Path>, content: &[u8]) -> Result<()> {
    let path = path.as_ref();

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        Some(_) => Path::new("."),
        None => {
            return Err(TurnscopeError::IoError {
                context: format!("Cannot determine parent directory for: {}", path.display()),
                source: io::Error::new(io::ErrorKind::InvalidInput, "No parent directory"),
            })
        }
    };

    if !parent.exists() {
        std::fs::create_dir_all(parent).map_err(|e| {
            TurnscopeError::io(format!("Failed to create directory: {}", parent.display()), e)
        })?;
    }

    // Same directory keeps the rename on one filesystem.
    let mut temp_file = NamedTempFile::new_in(parent).map_err(|e| {
        TurnscopeError::io(
            format!("Failed to create temporary file in: {}", parent.display()),
            e,
        )
    })?;

    temp_file.write_all(content).map_err(|e| {
        TurnscopeError::io(format!("Failed to write to temporary file for: {}", path.display()), e)
    })?;

    temp_file.flush().map_err(|e| {
        TurnscopeError::io(format!("Failed to flush temporary file for: {}", path.display()), e)
    })?;

    temp_file.persist(path).map_err(|e| {
        TurnscopeError::io(format!("Failed to atomically write file: {}", path.display()), e.error)
    })?;

    Ok(())
}

/// Serialize a value as pretty JSON and write it atomically.
pub fn atomic_write_json<T: Serialize + ?Sized>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_vec_pretty(value).map_err(|e| TurnscopeError::SerializationError {
        context: format!("Failed to serialize {}", path.display()),
        source: e,
    })?;
    atomic_write(path, &json)
}

/// Truncate a string for preview display, appending `...` when cut.
///
/// `max_len` is in bytes; the cut backs off to a character boundary.
#[must_use]
pub fn truncate_preview(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let mut end = max_len;
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

/// Truncate to at most `max_chars` characters, appending `...` when cut.
#[must_use]
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        None => s.to_string(),
        Some((idx, _)) => format!("{}...", &s[..idx]),
    }
}

/// Format bytes in a human-readable format.
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

/// Make an identifier safe to use as a file name.
///
/// ASCII alphanumerics, `-` and `_` pass through; every other byte, `%` and `.`
/// included, becomes `%XX`. The mapping is injective, so distinct ids never share a
/// file, and the result can never name a hidden or parent entry. The empty id maps
/// to a lone `%`, which no escaped id can produce.
#[must_use]
pub fn escape_file_name(id: &str) -> String {
    if id.is_empty() {
        return "%".to_string();
    }
    let mut name = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_') {
            name.push(char::from(byte));
        } else {
            name.push_str(&format!("%{byte:02X}"));
        }
    }
    name
}

/// Count whitespace-separated words.
#[must_use]
pub fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}

/// Clamp a score into [0, 100].
#[must_use]
pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}
