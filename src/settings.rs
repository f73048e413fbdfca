//! Application settings: which site folder is active.
//!
//! The settings document is a single JSON object stored outside any site,
//! by default at `$HOME/.config/shelfkeeper/settings.json`:
//!
//! ```json
//! { "libraryPath": "/home/me/sites/reading-list" }
//! ```
//!
//! A missing document means no site has been activated yet.

use crate::storage::{Storage, StorageError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("HOME is not set; pass --settings to choose a settings file")]
    NoHome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Active site folder. `None` until a site has been activated.
    pub library_path: Option<PathBuf>,
}

/// Reads and writes the settings document at a fixed path.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the per-user default location.
    pub fn at_default_location() -> Result<Self, SettingsError> {
        let home = std::env::var_os("HOME").ok_or(SettingsError::NoHome)?;
        Ok(Self::new(
            PathBuf::from(home).join(".config/shelfkeeper/settings.json"),
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self, storage: &impl Storage) -> Result<AppSettings, SettingsError> {
        if !storage.exists(&self.path)? {
            return Ok(AppSettings::default());
        }
        let bytes = storage.read_file(&self.path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn save(
        &self,
        storage: &mut impl Storage,
        settings: &AppSettings,
    ) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            storage.create_dir_all(parent)?;
        }
        let mut json = serde_json::to_string_pretty(settings)?;
        json.push('\n');
        storage.write_file(&self.path, json.as_bytes())?;
        Ok(())
    }
}
