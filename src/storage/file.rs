//! JSON file storage.
//!
//! Layout under the root directory:
//!
//! ```text
//! sessions/<session-id>.json
//! profiles/<user-id>.json
//! insights/<session-id>.json
//! ```
//!
//! Identifiers are percent-escaped before use as file names, so distinct ids always
//! map to distinct files. Every write goes through a
//! temporary file and an atomic rename.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::{page, Storage};
use crate::error::{Result, TurnscopeError};
use crate::insight::SessionInsight;
use crate::model::{Session, UserProfile};
use crate::util::{atomic_write_json, escape_file_name};

const SESSIONS_DIR: &str = "sessions";
const PROFILES_DIR: &str = "profiles";
const INSIGHTS_DIR: &str = "insights";

/// Storage backed by one JSON file per object.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Open a store rooted at `root`, creating the directory layout if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for dir in [SESSIONS_DIR, PROFILES_DIR, INSIGHTS_DIR] {
            let path = root.join(dir);
            fs::create_dir_all(&path).map_err(|e| match e.kind() {
                ErrorKind::PermissionDenied => TurnscopeError::PermissionDenied { path: path.clone() },
                _ => TurnscopeError::io(format!("Failed to create directory: {}", path.display()), e),
            })?;
        }
        debug!(root = %root.display(), "Opened JSON file store");
        Ok(Self { root })
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, dir: &str, id: &str) -> PathBuf {
        self.root.join(dir).join(format!("{}.json", escape_file_name(id)))
    }

    fn write<T: Serialize>(&self, dir: &str, id: &str, value: &T) -> Result<()> {
        atomic_write_json(self.path(dir, id), value)
    }

    fn read<T: DeserializeOwned>(&self, dir: &str, id: &str) -> Result<Option<T>> {
        read_json(&self.path(dir, id))
    }

    fn all_sessions(&self) -> Result<Vec<Session>> {
        let dir = self.root.join(SESSIONS_DIR);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(TurnscopeError::io(format!("Failed to list {}", dir.display()), e));
            }
        };

        let mut sessions = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| TurnscopeError::io(format!("Failed to list {}", dir.display()), e))?
                .path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_json::<Session>(&path) {
                Ok(Some(session)) => sessions.push(session),
                Ok(None) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable session file"),
            }
        }
        Ok(sessions)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            return Err(TurnscopeError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(TurnscopeError::io(format!("Failed to read {}", path.display()), e)),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| TurnscopeError::SerializationError {
            context: format!("Corrupt record in {}", path.display()),
            source: e,
        })
}

fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(TurnscopeError::io(format!("Failed to delete {}", path.display()), e)),
    }
}

impl Storage for JsonFileStore {
    fn save_session(&self, session: &Session) -> Result<()> {
        self.write(SESSIONS_DIR, &session.id, session)
    }

    fn get_session(&self, id: &str) -> Result<Option<Session>> {
        self.read(SESSIONS_DIR, id)
    }

    fn list_sessions(&self, limit: Option<usize>, offset: Option<usize>) -> Result<Vec<Session>> {
        Ok(page(self.all_sessions()?, limit, offset))
    }

    fn save_profile(&self, user_id: &str, profile: &UserProfile) -> Result<()> {
        self.write(PROFILES_DIR, user_id, profile)
    }

    fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        self.read(PROFILES_DIR, user_id)
    }

    fn save_insight(&self, insight: &SessionInsight) -> Result<()> {
        self.write(INSIGHTS_DIR, &insight.session_id, insight)
    }

    fn get_insight(&self, session_id: &str) -> Result<Option<SessionInsight>> {
        self.read(INSIGHTS_DIR, session_id)
    }

    fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut deleted = 0;
        for session in self.all_sessions()? {
            if session.end_time >= cutoff {
                continue;
            }
            if remove_if_exists(&self.path(SESSIONS_DIR, &session.id))? {
                deleted += 1;
            }
            remove_if_exists(&self.path(INSIGHTS_DIR, &session.id))?;
        }
        debug!(deleted, cutoff = %cutoff, "Pruned sessions");
        Ok(deleted)
    }
}
