//! Settings repository: the one seam the setup workflow depends on.
//!
//! [`SettingsRepository`] bundles the five capabilities setup needs: read and
//! save the settings, ask the user for a folder, validate it, and initialize
//! its data. Two implementations share the validation and provisioning code
//! and differ only in where settings live:
//!
//! - [`StorageRepository`]: settings persisted as a JSON document through any
//!   [`Storage`] (the real filesystem in the CLI).
//! - [`MemoryRepository`]: settings held in memory over a [`MemoryStorage`],
//!   for tests.

use crate::provision::{self, InitReport, ProvisionError};
use crate::settings::{AppSettings, SettingsError, SettingsStore};
use crate::storage::{MemoryStorage, Storage, StorageError};
use crate::validate::{self, SiteValidation};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Provision(#[from] ProvisionError),
}

pub trait SettingsRepository {
    fn get(&self) -> Result<AppSettings, RepositoryError>;

    fn save(&mut self, settings: &AppSettings) -> Result<(), RepositoryError>;

    /// Prompt for a site folder. `Ok(None)` when the user cancels.
    fn select_site_path(&mut self) -> Result<Option<PathBuf>, RepositoryError>;

    fn validate_site_path(&self, path: &Path) -> Result<SiteValidation, RepositoryError>;

    fn initialize_site_data(&mut self, path: &Path) -> Result<InitReport, RepositoryError>;
}

/// Settings persisted through a [`Storage`] backend.
#[derive(Debug)]
pub struct StorageRepository<S: Storage> {
    storage: S,
    store: SettingsStore,
}

impl<S: Storage> StorageRepository<S> {
    pub fn new(storage: S, store: SettingsStore) -> Self {
        Self { storage, store }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn settings_store(&self) -> &SettingsStore {
        &self.store
    }
}

impl<S: Storage> SettingsRepository for StorageRepository<S> {
    fn get(&self) -> Result<AppSettings, RepositoryError> {
        Ok(self.store.load(&self.storage)?)
    }

    fn save(&mut self, settings: &AppSettings) -> Result<(), RepositoryError> {
        Ok(self.store.save(&mut self.storage, settings)?)
    }

    fn select_site_path(&mut self) -> Result<Option<PathBuf>, RepositoryError> {
        Ok(self.storage.pick_folder()?)
    }

    fn validate_site_path(&self, path: &Path) -> Result<SiteValidation, RepositoryError> {
        Ok(validate::validate(&self.storage, path)?)
    }

    fn initialize_site_data(&mut self, path: &Path) -> Result<InitReport, RepositoryError> {
        Ok(provision::initialize(&mut self.storage, path)?)
    }
}

/// Settings kept in memory, site files in a [`MemoryStorage`].
#[derive(Debug, Default)]
pub struct MemoryRepository {
    storage: MemoryStorage,
    settings: AppSettings,
}

impl MemoryRepository {
    pub fn new(storage: MemoryStorage) -> Self {
        Self {
            storage,
            settings: AppSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: AppSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn storage(&self) -> &MemoryStorage {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut MemoryStorage {
        &mut self.storage
    }
}

impl SettingsRepository for MemoryRepository {
    fn get(&self) -> Result<AppSettings, RepositoryError> {
        Ok(self.settings.clone())
    }

    fn save(&mut self, settings: &AppSettings) -> Result<(), RepositoryError> {
        self.settings = settings.clone();
        Ok(())
    }

    fn select_site_path(&mut self) -> Result<Option<PathBuf>, RepositoryError> {
        Ok(self.storage.pick_folder()?)
    }

    fn validate_site_path(&self, path: &Path) -> Result<SiteValidation, RepositoryError> {
        Ok(validate::validate(&self.storage, path)?)
    }

    fn initialize_site_data(&mut self, path: &Path) -> Result<InitReport, RepositoryError> {
        Ok(provision::initialize(&mut self.storage, path)?)
    }
}
