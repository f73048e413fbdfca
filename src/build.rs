//! Content build pipeline: shelves of book records → deployable bundle.
//!
//! A build reads the site's template files and the book records of every
//! declared shelf, and writes a self-contained `dist/` folder:
//!
//! ```text
//! dist/
//! ├── index.html                  # Template files, copied verbatim
//! ├── styles-minimalist.css
//! ├── app.js
//! └── books/
//!     ├── index.json              # Manifest
//!     ├── top-5-reads/
//!     │   ├── a.json
//!     │   └── b.json
//!     └── good-reads/
//!         └── c.json
//! ```
//!
//! ## Manifest Order
//!
//! Shelves appear in declaration order. Within a shelf, only files directly in
//! the folder whose names end in `.json` are kept, sorted by plain byte order
//! (`B.json` before `a.json`). Subfolders and other files are ignored.
//!
//! ```json
//! [
//!     "top-5-reads/a.json",
//!     "top-5-reads/b.json",
//!     "good-reads/c.json"
//! ]
//! ```
//!
//! ## Failure Modes
//!
//! | Condition | Outcome |
//! |-----------|---------|
//! | Template file missing | [`BuildError::MissingTemplates`], lists all of them; bundle untouched |
//! | Bundle cannot be cleared or created | [`BuildError::Destination`], nothing copied |
//! | Shelf folder missing | [`BuildWarning::MissingShelf`], shelf contributes nothing |
//! | Shelf path is not a folder | [`BuildWarning::ShelfNotAFolder`], shelf contributes nothing |
//! | `*.json` entry that is not a regular file | [`BuildWarning::NotARegularFile`], entry skipped |
//! | `*.json` entry with a non-UTF-8 name | [`BuildWarning::UnreadableFilename`], entry skipped |
//! | Optional static file missing | [`BuildWarning::MissingStaticFile`] |
//!
//! Every build deletes the previous bundle first, so removed books never
//! linger and two builds of the same input produce identical output. Builds
//! must not run concurrently against the same site.

use crate::config::Shelf;
use crate::layout;
use crate::storage::{EntryKind, Storage, StorageError};
use crate::validate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Missing required template files: {}", .0.join(", "))]
    MissingTemplates(Vec<String>),
    #[error("Cannot prepare bundle directory {}: {source}", path.display())]
    Destination {
        path: PathBuf,
        #[source]
        source: StorageError,
    },
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which books root a build reads from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DataSource {
    #[default]
    Real,
    Sample,
}

impl DataSource {
    pub fn books_dir(self) -> &'static str {
        match self {
            DataSource::Real => layout::BOOKS_DIR,
            DataSource::Sample => layout::SAMPLE_BOOKS_DIR,
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Real => f.write_str("real"),
            DataSource::Sample => f.write_str("sample"),
        }
    }
}

/// Input and output locations for one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPaths {
    /// Site root holding the template files.
    pub site: PathBuf,
    /// Books root holding one folder per shelf.
    pub source: PathBuf,
    /// Bundle root, cleared on every build.
    pub bundle: PathBuf,
    pub data_source: DataSource,
}

impl BuildPaths {
    pub fn for_site(site: &Path, data_source: DataSource) -> Self {
        Self {
            site: site.to_path_buf(),
            source: site.join(data_source.books_dir()),
            bundle: layout::bundle_path(site),
            data_source,
        }
    }

    fn bundle_books(&self) -> PathBuf {
        self.bundle.join(layout::BOOKS_DIR)
    }
}

/// Ordered relative paths of every book in the bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildManifest {
    pub entries: Vec<String>,
}

impl BuildManifest {
    /// Four-space indented JSON array with a trailing newline.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        buf.push(b'\n');
        Ok(buf)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildWarning {
    MissingShelf { shelf: String, folder: PathBuf },
    ShelfNotAFolder { shelf: String, folder: PathBuf },
    NotARegularFile(PathBuf),
    /// `name` is a lossy rendering of the real filename.
    UnreadableFilename { folder: PathBuf, name: String },
    MissingStaticFile(String),
}

impl fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildWarning::MissingShelf { shelf, folder } => {
                write!(f, "Folder not found for shelf '{shelf}': {}", folder.display())
            }
            BuildWarning::ShelfNotAFolder { shelf, folder } => {
                write!(f, "Shelf '{shelf}' is not a folder: {}", folder.display())
            }
            BuildWarning::NotARegularFile(path) => {
                write!(f, "Skipped {}: not a regular file", path.display())
            }
            BuildWarning::UnreadableFilename { folder, name } => write!(
                f,
                "Skipped file with a non-UTF-8 name in {}: {name}",
                folder.display()
            ),
            BuildWarning::MissingStaticFile(name) => write!(f, "Static file not found: {name}"),
        }
    }
}

/// Per-shelf result of a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShelfSummary {
    pub id: String,
    pub label: String,
    pub folder: String,
    pub books: usize,
    /// False when the shelf folder did not exist or was not a folder.
    pub found: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub manifest: BuildManifest,
    pub shelves: Vec<ShelfSummary>,
    pub warnings: Vec<BuildWarning>,
    pub paths: BuildPaths,
    /// Static files copied into the bundle root, template files first.
    pub static_files: Vec<String>,
    /// SHA-256 of the manifest bytes, lowercase hex.
    pub manifest_digest: String,
}

/// Run a full build.
pub fn build(
    storage: &mut impl Storage,
    paths: &BuildPaths,
    shelves: &[Shelf],
) -> Result<BuildReport, BuildError> {
    let missing = validate::missing_templates(&*storage, &paths.site)?;
    if !missing.is_empty() {
        return Err(BuildError::MissingTemplates(missing));
    }

    prepare_bundle(storage, paths)?;
    info!(bundle = %paths.bundle.display(), "prepared bundle directory");

    let mut warnings = Vec::new();
    let static_files = copy_static_files(storage, paths, &mut warnings)?;

    let books_out = paths.bundle_books();
    let mut manifest = BuildManifest::default();
    let mut summaries = Vec::with_capacity(shelves.len());

    for shelf in shelves {
        let folder = paths.source.join(&shelf.folder);
        let files = match shelf_books(&*storage, &folder, &mut warnings)? {
            ShelfScan::Books(files) => files,
            ShelfScan::Missing => {
                warn!(shelf = %shelf.id, folder = %folder.display(), "shelf folder not found");
                warnings.push(BuildWarning::MissingShelf {
                    shelf: shelf.id.clone(),
                    folder,
                });
                summaries.push(summary(shelf, 0, false));
                continue;
            }
            ShelfScan::NotAFolder => {
                warn!(shelf = %shelf.id, path = %folder.display(), "shelf path is not a folder");
                warnings.push(BuildWarning::ShelfNotAFolder {
                    shelf: shelf.id.clone(),
                    folder,
                });
                summaries.push(summary(shelf, 0, false));
                continue;
            }
        };

        if !files.is_empty() {
            let shelf_out = books_out.join(&shelf.folder);
            storage.create_dir_all(&shelf_out)?;
            for name in &files {
                storage.copy_file(&folder.join(name), &shelf_out.join(name))?;
                manifest.entries.push(format!("{}/{}", shelf.folder, name));
            }
        }
        info!(shelf = %shelf.id, books = files.len(), "copied shelf");
        summaries.push(summary(shelf, files.len(), true));
    }

    let bytes = manifest.to_json_bytes()?;
    storage.write_file(&books_out.join(layout::MANIFEST_FILE), &bytes)?;
    let manifest_digest = format!("{:x}", Sha256::digest(&bytes));
    info!(books = manifest.len(), digest = %manifest_digest, "wrote manifest");

    Ok(BuildReport {
        manifest,
        shelves: summaries,
        warnings,
        paths: paths.clone(),
        static_files,
        manifest_digest,
    })
}

fn summary(shelf: &Shelf, books: usize, found: bool) -> ShelfSummary {
    ShelfSummary {
        id: shelf.id.clone(),
        label: shelf.label.clone(),
        folder: shelf.folder.clone(),
        books,
        found,
    }
}

/// Remove any previous bundle and create an empty one with its books folder.
fn prepare_bundle(storage: &mut impl Storage, paths: &BuildPaths) -> Result<(), BuildError> {
    let bundle = &paths.bundle;
    if storage.exists(bundle).map_err(|e| destination(bundle, e))? {
        storage
            .remove_dir_all(bundle)
            .map_err(|e| destination(bundle, e))?;
    }
    let books_out = paths.bundle_books();
    storage
        .create_dir_all(&books_out)
        .map_err(|e| destination(&books_out, e))?;
    Ok(())
}

fn destination(path: &Path, source: StorageError) -> BuildError {
    BuildError::Destination {
        path: path.to_path_buf(),
        source,
    }
}

/// Copy template files (all known present) and whichever optional files exist.
fn copy_static_files(
    storage: &mut impl Storage,
    paths: &BuildPaths,
    warnings: &mut Vec<BuildWarning>,
) -> Result<Vec<String>, BuildError> {
    let mut copied = Vec::new();
    for file in layout::TEMPLATE_FILES {
        storage.copy_file(&paths.site.join(file), &paths.bundle.join(file))?;
        copied.push((*file).to_string());
    }
    for file in layout::OPTIONAL_STATIC_FILES {
        let src = paths.site.join(file);
        if storage.exists(&src)? {
            storage.copy_file(&src, &paths.bundle.join(file))?;
            copied.push((*file).to_string());
        } else {
            warn!(file, "optional static file not found");
            warnings.push(BuildWarning::MissingStaticFile((*file).to_string()));
        }
    }
    Ok(copied)
}

enum ShelfScan {
    Missing,
    NotAFolder,
    Books(Vec<String>),
}

/// Book record filenames directly in `folder`, sorted. Only regular files
/// with the book extension count; skipped `*.json` entries are recorded as
/// warnings.
fn shelf_books(
    storage: &impl Storage,
    folder: &Path,
    warnings: &mut Vec<BuildWarning>,
) -> Result<ShelfScan, BuildError> {
    if !storage.exists(folder)? {
        return Ok(ShelfScan::Missing);
    }
    if !storage.is_dir(folder)? {
        return Ok(ShelfScan::NotAFolder);
    }

    let mut names = Vec::new();
    for entry in storage.list_directory(folder)? {
        if !entry.name.ends_with(layout::BOOK_EXTENSION) {
            continue;
        }
        match entry.kind {
            EntryKind::File => names.push(entry.name),
            EntryKind::Dir => {}
            EntryKind::Other => {
                let path = folder.join(&entry.name);
                warn!(path = %path.display(), "skipping book entry that is not a regular file");
                warnings.push(BuildWarning::NotARegularFile(path));
            }
            EntryKind::UnreadableName => {
                warn!(folder = %folder.display(), name = %entry.name, "skipping non-UTF-8 filename");
                warnings.push(BuildWarning::UnreadableFilename {
                    folder: folder.to_path_buf(),
                    name: entry.name,
                });
            }
        }
    }
    names.sort();
    Ok(ShelfScan::Books(names))
}
