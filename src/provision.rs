//! Site provisioning: fill in missing data files, then activate.
//!
//! [`initialize`] only fills gaps. For a folder that already has its template
//! files it creates whichever of `config.json` and `books/` is absent and
//! never touches anything that exists, so running it again after a partial
//! failure picks up where the last run stopped.
//!
//! [`activate`] records the site as the active one. It takes a
//! [`ReadySite`], which can only be built from a validation showing the
//! template files, config, and books folder all present.

use crate::config::{Config, ConfigError};
use crate::layout;
use crate::repository::{RepositoryError, SettingsRepository};
use crate::settings::AppSettings;
use crate::storage::{Storage, StorageError};
use crate::validate::{self, ReadySite};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Not a site folder; missing template files: {}", .0.join(", "))]
    NotASite(Vec<String>),
    #[error("Initialization incomplete (created: {created:?}): {source}")]
    Partial {
        created: Vec<&'static str>,
        #[source]
        source: StorageError,
    },
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// What [`initialize`] created. Both false means the site was already complete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InitReport {
    pub created_config: bool,
    pub created_books: bool,
}

impl InitReport {
    pub fn created(&self) -> Vec<&'static str> {
        let mut items = Vec::new();
        if self.created_config {
            items.push(layout::CONFIG_FILE);
        }
        if self.created_books {
            items.push(layout::BOOKS_DIR);
        }
        items
    }

    pub fn is_noop(&self) -> bool {
        !self.created_config && !self.created_books
    }
}

/// Create the default `config.json` and an empty `books/` where missing.
///
/// Fails with [`ProvisionError::NotASite`] (writing nothing) if any template
/// file is missing. The config document is written atomically; if a step
/// fails, files from earlier steps stay and a retry only creates the rest.
pub fn initialize(storage: &mut impl Storage, site: &Path) -> Result<InitReport, ProvisionError> {
    let validation = validate::validate(&*storage, site)?;
    if !validation.has_template_files {
        return Err(ProvisionError::NotASite(validation.missing_files));
    }

    let mut report = InitReport::default();
    let partial = |report: &InitReport, source: StorageError| ProvisionError::Partial {
        created: report.created(),
        source,
    };

    if !validation.has_config {
        let json = Config::default().to_json()?;
        storage
            .write_file(&layout::config_path(site), json.as_bytes())
            .map_err(|e| partial(&report, e))?;
        report.created_config = true;
    }

    if !validation.has_books {
        storage
            .create_dir_all(&layout::books_path(site))
            .map_err(|e| partial(&report, e))?;
        report.created_books = true;
    }

    if report.is_noop() {
        info!(site = %site.display(), "site already initialized");
    } else {
        info!(site = %site.display(), created = ?report.created(), "initialized site data");
    }
    Ok(report)
}

/// Make `site` the active site and persist the setting.
pub fn activate<R: SettingsRepository>(
    repo: &mut R,
    site: ReadySite,
) -> Result<AppSettings, RepositoryError> {
    let settings = AppSettings {
        library_path: Some(site.into_path()),
    };
    repo.save(&settings)?;
    info!(site = ?settings.library_path, "activated site");
    Ok(settings)
}
