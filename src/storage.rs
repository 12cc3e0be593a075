//! Local persistence for scan settings and scan history.
//!
//! Everything lives in one directory, by default `~/.config/scan_tui/`:
//!
//! ```text
//! <root>/
//!   settings.toml    # Last-used scan settings (rewritten on every change)
//!   history.jsonl    # Append-only record of completed scans
//! ```
//!
//! Persistence is best-effort from the session's point of view. The
//! `try_*` methods return errors; the plain methods log and swallow them
//! so a read-only home directory never stops anyone from scanning.

mod history;
mod settings;

use std::{io, path::PathBuf};

const SETTINGS_FILE: &str = "settings.toml";
const HISTORY_FILE: &str = "history.jsonl";

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid settings file: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("could not serialize settings: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

pub type Result<T> = core::result::Result<T, StorageError>;

/// File-based store for settings and history.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Creates a store rooted at the given directory.
    ///
    /// Nothing is touched on disk until the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the default storage root: `<config dir>/scan_tui/`.
    pub fn default_root() -> Option<PathBuf> {
        dirs::config_dir().map(|c| c.join("scan_tui"))
    }

    pub fn settings_path(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE)
    }

    pub fn history_path(&self) -> PathBuf {
        self.root.join(HISTORY_FILE)
    }
}
