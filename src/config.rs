//! Site configuration module.
//!
//! Handles loading, validating, editing, and saving the site's `config.json`.
//! The document lives at the site root and is owned by the site, not by this
//! tool: the setup workflow only creates it when it is missing, and after that
//! it changes only through an explicit [`save`].
//!
//! ## Config File Format
//!
//! ```json
//! {
//!   "siteTitle": "What I'm Reading",
//!   "siteSubtitle": "Books worth your time",
//!   "footerText": "Updated monthly",
//!   "shelves": [
//!     { "id": "top-5-reads", "label": "Top 5 Reads", "folder": "top-5-reads" },
//!     { "id": "good-reads", "label": "Good Reads", "folder": "good-reads" }
//!   ]
//! }
//! ```
//!
//! All keys are optional when reading. Missing text fields are empty and a
//! missing `shelves` list falls back to [`default_shelves`].
//!
//! ## Shelf Identity
//!
//! Shelf `id` and `folder` values are fixed once the config exists: book
//! records live in `books/<folder>/`, so renaming a folder in the config would
//! silently orphan them. Labels may change freely. [`save`] rejects any change
//! to the ordered list of `(id, folder)` pairs.

use crate::layout;
use crate::storage::{Storage, StorageError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("No config.json in {0}")]
    Missing(String),
    #[error("Shelf ids and folders cannot change once created (stored: {stored}, new: {new})")]
    ShelfIdentityChanged { stored: String, new: String },
}

/// Site configuration loaded from `config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub site_title: String,
    pub site_subtitle: String,
    pub footer_text: String,
    /// Shelves in display order. Build output follows this order.
    pub shelves: Vec<Shelf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_title: String::new(),
            site_subtitle: String::new(),
            footer_text: String::new(),
            shelves: default_shelves(),
        }
    }
}

/// A named category of books, backed by a folder under the books root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shelf {
    pub id: String,
    pub label: String,
    pub folder: String,
}

impl Shelf {
    pub fn new(id: &str, label: &str, folder: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            folder: folder.to_string(),
        }
    }
}

/// The shelf set scaffolded into a new site.
pub fn default_shelves() -> Vec<Shelf> {
    vec![
        Shelf::new("top-5-reads", "Top 5 Reads", "top-5-reads"),
        Shelf::new("good-reads", "Good Reads", "good-reads"),
        Shelf::new(
            "current-and-future-reads",
            "Current & Future Reads",
            "current-and-future-reads",
        ),
    ]
}

impl Config {
    /// Validate shelf declarations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        let mut folders = HashSet::new();
        for shelf in &self.shelves {
            if shelf.id.trim().is_empty() {
                return Err(ConfigError::Validation("shelf id must not be empty".into()));
            }
            if !seen.insert(shelf.id.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate shelf id '{}'",
                    shelf.id
                )));
            }
            let folder = shelf.folder.as_str();
            if folder.is_empty()
                || folder == "."
                || folder == ".."
                || folder.contains(['/', '\\'])
            {
                return Err(ConfigError::Validation(format!(
                    "shelf '{}' folder must be a single folder name, got '{}'",
                    shelf.id, shelf.folder
                )));
            }
            if !folders.insert(folder) {
                return Err(ConfigError::Validation(format!(
                    "shelf '{}' reuses folder '{}'",
                    shelf.id, shelf.folder
                )));
            }
        }
        Ok(())
    }

    /// Return a copy with the text edits applied. Shelves are untouched.
    pub fn with_edits(&self, edit: &ConfigEdit) -> Config {
        let pick = |new: &Option<String>, old: &str| match new {
            Some(v) => v.trim().to_string(),
            None => old.to_string(),
        };
        Config {
            site_title: pick(&edit.site_title, &self.site_title),
            site_subtitle: pick(&edit.site_subtitle, &self.site_subtitle),
            footer_text: pick(&edit.footer_text, &self.footer_text),
            shelves: self.shelves.clone(),
        }
    }

    fn shelf_identity(&self) -> Vec<(&str, &str)> {
        self.shelves
            .iter()
            .map(|s| (s.id.as_str(), s.folder.as_str()))
            .collect()
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }
}

/// Text edits from the config editor. `None` leaves a field as it is;
/// `Some` values are trimmed.
#[derive(Debug, Clone, Default)]
pub struct ConfigEdit {
    pub site_title: Option<String>,
    pub site_subtitle: Option<String>,
    pub footer_text: Option<String>,
}

impl ConfigEdit {
    pub fn is_empty(&self) -> bool {
        self.site_title.is_none() && self.site_subtitle.is_none() && self.footer_text.is_none()
    }
}

/// Load `config.json` from a site folder.
///
/// Returns `Ok(None)` if the site has no config yet.
/// Returns `Err` if the file exists but is invalid.
pub fn load_optional(storage: &impl Storage, site: &Path) -> Result<Option<Config>, ConfigError> {
    let path = layout::config_path(site);
    if !storage.exists(&path)? {
        return Ok(None);
    }
    let bytes = storage.read_file(&path)?;
    let config: Config = serde_json::from_slice(&bytes)?;
    config.validate()?;
    Ok(Some(config))
}

/// Load `config.json`, failing if the site has none.
pub fn load(storage: &impl Storage, site: &Path) -> Result<Config, ConfigError> {
    load_optional(storage, site)?
        .ok_or_else(|| ConfigError::Missing(site.display().to_string()))
}

/// Validate and atomically write `config.json`.
///
/// If a config already exists, its shelf ids and folders must match.
pub fn save(storage: &mut impl Storage, site: &Path, config: &Config) -> Result<(), ConfigError> {
    config.validate()?;
    if let Some(stored) = load_optional(&*storage, site)? {
        let (old, new) = (stored.shelf_identity(), config.shelf_identity());
        if old != new {
            return Err(ConfigError::ShelfIdentityChanged {
                stored: format!("{old:?}"),
                new: format!("{new:?}"),
            });
        }
    }
    let json = config.to_json()?;
    storage.write_file(&layout::config_path(site), json.as_bytes())?;
    Ok(())
}

/// Apply text edits to the stored config and save it.
pub fn apply_edit(
    storage: &mut impl Storage,
    site: &Path,
    edit: &ConfigEdit,
) -> Result<Config, ConfigError> {
    let updated = load(&*storage, site)?.with_edits(edit);
    save(storage, site, &updated)?;
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn site() -> &'static Path {
        Path::new("/site")
    }

    #[test]
    fn default_config_has_empty_text_and_three_shelves() {
        let config = Config::default();
        assert_eq!(config.site_title, "");
        assert_eq!(config.site_subtitle, "");
        assert_eq!(config.footer_text, "");
        let folders: Vec<&str> = config.shelves.iter().map(|s| s.folder.as_str()).collect();
        assert_eq!(
            folders,
            vec!["top-5-reads", "good-reads", "current-and-future-reads"]
        );
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let json = Config::default().to_json().unwrap();
        assert!(json.contains("\"siteTitle\""));
        assert!(json.contains("\"siteSubtitle\""));
        assert!(json.contains("\"footerText\""));
        assert!(json.ends_with("}\n"));
    }

    #[test]
    fn partial_document_fills_defaults() {
        let storage =
            MemoryStorage::new().with_file("/site/config.json", r#"{ "siteTitle": "Reads" }"#);
        let config = load(&storage, site()).unwrap();
        assert_eq!(config.site_title, "Reads");
        assert_eq!(config.shelves, default_shelves());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let storage = MemoryStorage::new().with_file(
            "/site/config.json",
            r#"{ "siteTitle": "Reads", "theme": "dark", "shelves": [] }"#,
        );
        let config = load(&storage, site()).unwrap();
        assert!(config.shelves.is_empty());
    }

    #[test]
    fn missing_config_is_none() {
        let storage = MemoryStorage::new().with_dir("/site");
        assert!(load_optional(&storage, site()).unwrap().is_none());
        assert!(matches!(load(&storage, site()), Err(ConfigError::Missing(_))));
    }

    #[test]
    fn duplicate_shelf_ids_rejected() {
        let config = Config {
            shelves: vec![Shelf::new("a", "A", "a"), Shelf::new("a", "A2", "b")],
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn shared_shelf_folder_rejected() {
        let config = Config {
            shelves: vec![Shelf::new("a", "A", "reads"), Shelf::new("b", "B", "reads")],
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn shelf_folder_with_separator_rejected() {
        for folder in ["", "..", "a/b", "a\\b"] {
            let config = Config {
                shelves: vec![Shelf::new("a", "A", folder)],
                ..Config::default()
            };
            assert!(config.validate().is_err(), "folder {folder:?} accepted");
        }
    }

    #[test]
    fn edits_are_trimmed_and_keep_shelves() {
        let config = Config::default();
        let edit = ConfigEdit {
            site_title: Some("  My Reads  ".into()),
            footer_text: Some("\tfooter\n".into()),
            ..ConfigEdit::default()
        };
        let updated = config.with_edits(&edit);
        assert_eq!(updated.site_title, "My Reads");
        assert_eq!(updated.site_subtitle, "");
        assert_eq!(updated.footer_text, "footer");
        assert_eq!(updated.shelves, config.shelves);
    }

    #[test]
    fn apply_edit_persists() {
        let mut storage = MemoryStorage::new().with_dir("/site");
        save(&mut storage, site(), &Config::default()).unwrap();
        let edit = ConfigEdit {
            site_subtitle: Some("Books worth your time".into()),
            ..ConfigEdit::default()
        };
        apply_edit(&mut storage, site(), &edit).unwrap();
        assert_eq!(
            load(&storage, site()).unwrap().site_subtitle,
            "Books worth your time"
        );
    }

    #[test]
    fn relabeling_shelf_allowed_but_renaming_folder_rejected() {
        let mut storage = MemoryStorage::new().with_dir("/site");
        save(&mut storage, site(), &Config::default()).unwrap();

        let mut relabeled = Config::default();
        relabeled.shelves[0].label = "Favourites".into();
        save(&mut storage, site(), &relabeled).unwrap();

        let mut renamed = relabeled.clone();
        renamed.shelves[0].folder = "favourites".into();
        assert!(matches!(
            save(&mut storage, site(), &renamed),
            Err(ConfigError::ShelfIdentityChanged { .. })
        ));
        assert_eq!(load(&storage, site()).unwrap(), relabeled);
    }
}
