//! Site readiness validation.
//!
//! Classifies a candidate folder into one of three outcomes:
//!
//! | Outcome | Template files | `config.json` + `books/` |
//! |---------|----------------|--------------------------|
//! | [`Readiness::Ready`] | all present | both present |
//! | [`Readiness::NeedsInitialization`] | all present | one or both missing |
//! | [`Readiness::Invalid`] | any missing | not checked for meaning |
//!
//! An incomplete site is a normal result, not an error. The only error is the
//! storage backend itself failing.
//!
//! Validation only reads, so calling it twice without writes in between gives
//! the same [`SiteValidation`].

use crate::layout;
use crate::storage::{Storage, StorageError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Result of inspecting a folder.
///
/// `is_valid` always equals `has_template_files`. `has_config` and
/// `has_books` only carry meaning when the folder is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteValidation {
    pub is_valid: bool,
    pub has_template_files: bool,
    pub has_config: bool,
    pub has_books: bool,
    /// Absent template files, in [`layout::TEMPLATE_FILES`] order.
    pub missing_files: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    NeedsInitialization,
    Invalid,
}

impl SiteValidation {
    pub fn readiness(&self) -> Readiness {
        if !self.is_valid {
            Readiness::Invalid
        } else if self.has_config && self.has_books {
            Readiness::Ready
        } else {
            Readiness::NeedsInitialization
        }
    }

    /// What initialization would create for this folder.
    pub fn will_create(&self) -> Vec<&'static str> {
        let mut items = Vec::new();
        if !self.has_config {
            items.push(layout::CONFIG_FILE);
        }
        if !self.has_books {
            items.push(layout::BOOKS_DIR);
        }
        items
    }
}

/// Inspect `site` for template files, `config.json`, and the books folder.
pub fn validate(storage: &impl Storage, site: &Path) -> Result<SiteValidation, StorageError> {
    let missing_files = missing_templates(storage, site)?;
    let has_template_files = missing_files.is_empty();
    let has_config = storage.exists(&layout::config_path(site))?;
    let has_books = storage.is_dir(&layout::books_path(site))?;

    Ok(SiteValidation {
        is_valid: has_template_files,
        has_template_files,
        has_config,
        has_books,
        missing_files,
    })
}

/// Every required template file absent from `site`, in declared order.
///
/// Shared with the build pipeline so both report the same list.
pub fn missing_templates(storage: &impl Storage, site: &Path) -> Result<Vec<String>, StorageError> {
    let mut missing = Vec::new();
    for file in layout::TEMPLATE_FILES {
        if !storage.exists(&site.join(file))? {
            missing.push((*file).to_string());
        }
    }
    Ok(missing)
}

/// A folder proven ready for activation.
///
/// The only way to obtain one is [`ReadySite::from_validation`] with a
/// validation where the template files, config, and books folder all exist,
/// which keeps activation of a half-provisioned site unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadySite {
    path: PathBuf,
}

impl ReadySite {
    pub fn from_validation(path: &Path, validation: &SiteValidation) -> Option<Self> {
        (validation.readiness() == Readiness::Ready).then(|| Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::test_helpers::*;
    use proptest::prelude::*;

    #[test]
    fn complete_site_is_ready() {
        let storage = ready_site();
        let v = validate(&storage, site()).unwrap();
        assert!(v.is_valid && v.has_template_files && v.has_config && v.has_books);
        assert!(v.missing_files.is_empty());
        assert_eq!(v.readiness(), Readiness::Ready);
    }

    #[test]
    fn templates_only_needs_initialization() {
        let storage = template_only_site();
        let v = validate(&storage, site()).unwrap();
        assert!(v.is_valid);
        assert!(!v.has_config);
        assert!(!v.has_books);
        assert_eq!(v.readiness(), Readiness::NeedsInitialization);
        assert_eq!(v.will_create(), vec!["config.json", "books"]);
    }

    #[test]
    fn only_books_missing_needs_initialization() {
        let storage = template_only_site().with_file("/site/config.json", "{}");
        let v = validate(&storage, site()).unwrap();
        assert_eq!(v.readiness(), Readiness::NeedsInitialization);
        assert_eq!(v.will_create(), vec!["books"]);
    }

    #[test]
    fn empty_books_folder_counts_as_present() {
        let storage = template_only_site()
            .with_file("/site/config.json", "{}")
            .with_dir("/site/books");
        assert!(validate(&storage, site()).unwrap().has_books);
    }

    #[test]
    fn books_file_is_not_a_books_folder() {
        let storage = template_only_site()
            .with_file("/site/config.json", "{}")
            .with_file("/site/books", "not a folder");
        let v = validate(&storage, site()).unwrap();
        assert!(!v.has_books);
        assert_eq!(v.readiness(), Readiness::NeedsInitialization);
        assert!(ReadySite::from_validation(site(), &v).is_none());
    }

    #[test]
    fn every_missing_template_listed_in_declared_order() {
        let storage = MemoryStorage::new().with_file("/site/styles-minimalist.css", "");
        let v = validate(&storage, site()).unwrap();
        assert!(!v.is_valid);
        assert!(!v.has_template_files);
        assert_eq!(v.missing_files, vec!["index.html", "app.js"]);
        assert_eq!(v.readiness(), Readiness::Invalid);
    }

    #[test]
    fn missing_folder_is_invalid_not_error() {
        let storage = MemoryStorage::new();
        let v = validate(&storage, Path::new("/nowhere")).unwrap();
        assert!(!v.is_valid);
        assert_eq!(v.missing_files.len(), layout::TEMPLATE_FILES.len());
    }

    #[test]
    fn validation_is_idempotent() {
        let storage = template_only_site().with_dir("/site/books");
        let first = validate(&storage, site()).unwrap();
        let second = validate(&storage, site()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unavailable_storage_is_an_error() {
        let mut storage = ready_site();
        storage.set_unavailable(true);
        assert!(matches!(
            validate(&storage, site()),
            Err(StorageError::Unavailable(_))
        ));
    }

    #[test]
    fn serializes_camel_case() {
        let v = validate(&ready_site(), site()).unwrap();
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["isValid"], true);
        assert_eq!(json["hasTemplateFiles"], true);
        assert_eq!(json["missingFiles"], serde_json::json!([]));
    }

    #[test]
    fn ready_site_only_from_ready_validation() {
        let ready = validate(&ready_site(), site()).unwrap();
        assert!(ReadySite::from_validation(site(), &ready).is_some());

        let partial = validate(&template_only_site(), site()).unwrap();
        assert!(ReadySite::from_validation(site(), &partial).is_none());
    }

    proptest! {
        #[test]
        fn missing_files_match_absent_templates(present in proptest::collection::vec(any::<bool>(), 3)) {
            let mut storage = MemoryStorage::new().with_dir("/site");
            for (file, here) in layout::TEMPLATE_FILES.iter().zip(&present) {
                if *here {
                    storage.put_file(site().join(file), "x");
                }
            }
            let v = validate(&storage, site()).unwrap();
            let expected: Vec<String> = layout::TEMPLATE_FILES
                .iter()
                .zip(&present)
                .filter(|(_, here)| !**here)
                .map(|(f, _)| f.to_string())
                .collect();
            prop_assert_eq!(v.is_valid, present.iter().all(|p| *p));
            prop_assert_eq!(v.is_valid, v.has_template_files);
            prop_assert_eq!(v.missing_files, expected);
        }
    }
}
