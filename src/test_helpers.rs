//! Shared test utilities.
//!
//! In-memory sites rooted at `/site` for unit tests, plus helpers that lay
//! out real site folders on disk for the filesystem-backed tests.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let storage = template_only_site();
//! let v = validate::validate(&storage, site()).unwrap();
//! assert!(v.is_valid && !v.has_config);
//!
//! let tmp = setup_fixtures();
//! let v = validate::validate(&FsStorage::new(), tmp.path()).unwrap();
//! assert!(v.has_books);
//! ```

use crate::layout;
use crate::storage::MemoryStorage;
use std::path::Path;
use tempfile::TempDir;

// =========================================================================
// In-memory sites
// =========================================================================

/// Root of every in-memory site.
pub fn site() -> &'static Path {
    Path::new("/site")
}

/// Template files only: valid, but needs initialization.
pub fn template_only_site() -> MemoryStorage {
    layout::TEMPLATE_FILES
        .iter()
        .fold(MemoryStorage::new(), |storage, file| {
            storage.with_file(site().join(file), format!("/* {file} */"))
        })
}

/// Template files, a default `config.json`, and an empty `books/`.
pub fn ready_site() -> MemoryStorage {
    template_only_site()
        .with_file(
            site().join(layout::CONFIG_FILE),
            crate::config::Config::default().to_json().unwrap(),
        )
        .with_dir(site().join(layout::BOOKS_DIR))
}

// =========================================================================
// On-disk sites
// =========================================================================

/// Write the template files into `dir`, creating it.
pub fn write_templates_on_disk(dir: &Path) {
    std::fs::create_dir_all(dir).unwrap();
    for file in layout::TEMPLATE_FILES {
        std::fs::write(dir.join(file), format!("/* {file} */")).unwrap();
    }
}

/// Copy `fixtures/site/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}
