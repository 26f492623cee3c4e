//! Persisted session (the logged-in identity).
//!
//! Stored as JSON at `$YTSPRINT_HOME/session.json`. Writes take an
//! exclusive lock so concurrent invocations never interleave.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::Identity;

/// Errors reading or writing the session file
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt session file: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// What is written to disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub identity: Identity,
    pub logged_in_at: DateTime<Utc>,
}

/// File-backed session storage
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Session store at the configured default location
    pub fn open_default() -> anyhow::Result<Self> {
        Ok(Self::new(crate::config::paths::session_file()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved session; a missing file means nobody is logged in
    pub fn load(&self) -> Result<Option<Session>, SessionError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Convenience: just the identity
    pub fn identity(&self) -> Result<Option<Identity>, SessionError> {
        Ok(self.load()?.map(|s| s.identity))
    }

    /// Persist `identity` as the current session
    pub fn save(&self, identity: &Identity) -> Result<Session, SessionError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let session = Session {
            identity: identity.clone(),
            logged_in_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&session)?;

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&self.path)?;

        // Truncate only once the lock is held
        file.lock_exclusive()?;
        file.set_len(0)?;
        file.write_all(json.as_bytes())?;
        file.flush()?;

        debug!(path = %self.path.display(), "session saved");
        Ok(session)
    }

    /// Forget the current session
    pub fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_session_is_none() {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::new(temp.path().join("session.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_load_clear() {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::new(temp.path().join("nested").join("session.json"));

        store.save(&Identity::email("a@adda247.com")).unwrap();
        assert_eq!(
            store.identity().unwrap(),
            Some(Identity::email("a@adda247.com"))
        );

        // Overwriting a longer session with a shorter one leaves no trailing bytes
        store
            .save(&Identity::Named {
                name: "Ravi".to_string(),
                token: Some("x".repeat(64)),
            })
            .unwrap();
        store.save(&Identity::named("R")).unwrap();
        assert_eq!(store.identity().unwrap(), Some(Identity::named("R")));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_session_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = SessionStore::new(&path);
        assert!(matches!(store.load(), Err(SessionError::Serialization(_))));
    }
}
