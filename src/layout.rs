//! Fixed on-disk layout of a site folder.
//!
//! Every component that touches a site goes through these constants, so the
//! validator and the build pipeline can never disagree about which files make
//! a folder a site.
//!
//! ```text
//! site/
//! ├── index.html                  # Required template files
//! ├── styles-minimalist.css
//! ├── app.js
//! ├── favicon.ico                 # Optional static files (copied if present)
//! ├── config.json                 # Site config (title, subtitle, shelves)
//! ├── books/                      # Real book records, one folder per shelf
//! │   ├── top-5-reads/
//! │   │   └── dune.json
//! │   └── good-reads/
//! ├── books-sample/               # Sample records, same shape as books/
//! └── dist/                       # Build output (cleared on every build)
//!     ├── index.html
//!     └── books/
//!         ├── index.json          # Generated manifest
//!         └── top-5-reads/dune.json
//! ```

use std::path::{Path, PathBuf};

/// Template files that qualify a folder as a site, in declared order.
///
/// Validation reports missing files in this order and the build copies them
/// into the bundle root.
pub const TEMPLATE_FILES: &[&str] = &["index.html", "styles-minimalist.css", "app.js"];

/// Static files copied into the bundle when present. Absence is a warning.
pub const OPTIONAL_STATIC_FILES: &[&str] = &["favicon.ico", "robots.txt"];

/// Site config document at the site root.
pub const CONFIG_FILE: &str = "config.json";

/// Books root holding real data.
pub const BOOKS_DIR: &str = "books";

/// Books root holding sample data.
pub const SAMPLE_BOOKS_DIR: &str = "books-sample";

/// Build output directory at the site root.
pub const BUNDLE_DIR: &str = "dist";

/// Manifest filename inside the bundle's books folder.
pub const MANIFEST_FILE: &str = "index.json";

/// Extension of a book record document.
pub const BOOK_EXTENSION: &str = ".json";

pub fn config_path(site: &Path) -> PathBuf {
    site.join(CONFIG_FILE)
}

pub fn books_path(site: &Path) -> PathBuf {
    site.join(BOOKS_DIR)
}

pub fn bundle_path(site: &Path) -> PathBuf {
    site.join(BUNDLE_DIR)
}
