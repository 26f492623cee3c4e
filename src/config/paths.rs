//! Canonical paths for ytsprint state.
//!
//! ```rust,ignore
//! use ytsprint::config::paths;
//!
//! let session = paths::session_file()?;
//! ```

use std::path::PathBuf;

use anyhow::Result;

/// File `ytsprint export` writes to when no path is given
pub const DEFAULT_EXPORT_FILE: &str = "export.csv";

/// Get the ytsprint home directory (~/.ytsprint)
pub fn ytsprint_home() -> Result<PathBuf> {
    crate::config::ytsprint_home()
}

/// Get the session file path (~/.ytsprint/session.json)
pub fn session_file() -> Result<PathBuf> {
    Ok(ytsprint_home()?.join("session.json"))
}

/// Default export destination, relative to the working directory
pub fn default_export_file() -> PathBuf {
    PathBuf::from(DEFAULT_EXPORT_FILE)
}
