//! Persisted server settings.
//!
//! One JSON document at `<data>/settings.json` holds the operator's
//! choices and the administration database. Missing fields fall back to
//! their defaults, so older files keep loading as settings are added.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use outpost_admin::Administration;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default port the game server listens on.
pub const DEFAULT_PORT: u16 = 6567;

/// Settings file name inside the data directory.
pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write settings to {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("malformed settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Game port opened by `host` and `load`.
    pub port: u16,
    /// Rotate to another map on game over instead of closing.
    pub shuffle: bool,
    /// Write log lines to the rotating log file.
    pub logging: bool,
    pub crashreport: bool,
    /// Open the command socket at startup.
    pub socket: bool,
    /// Display name shown to players.
    pub name: String,
    /// Join password. Empty means none.
    pub password: String,
    pub admin: Administration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            shuffle: true,
            logging: true,
            crashreport: false,
            socket: false,
            name: "Server".to_string(),
            password: String::new(),
            admin: Administration::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// SettingsStore
// ---------------------------------------------------------------------------

/// Reads and writes [`Settings`] at a fixed path.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The store for `settings.json` inside `data_dir`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(SETTINGS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the settings, or the defaults when no file exists yet.
    pub fn load(&self) -> Result<Settings, SettingsError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no settings file, using defaults");
                return Ok(Settings::default());
            }
            Err(source) => {
                return Err(SettingsError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        serde_json::from_str(&text).map_err(|source| SettingsError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Writes the settings, creating the data directory if needed.
    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let write_err = |source| SettingsError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(settings)
            .map_err(|e| write_err(io::Error::other(e)))?;
        fs::write(&self.path, json).map_err(write_err)?;
        debug!(path = %self.path.display(), "settings saved");
        Ok(())
    }
}
