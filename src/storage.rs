//! Storage provider: folder picking and raw file I/O.
//!
//! Everything in this crate that touches a site folder goes through the
//! [`Storage`] trait. Two implementations honor the same contract:
//!
//! - [`FsStorage`]: the real filesystem. The folder picker is a terminal
//!   prompt; writes are atomic (temp file in the same directory, then rename).
//! - [`MemoryStorage`]: an in-memory tree used by tests. It is not durable,
//!   but it follows the same rules: writing or copying into a missing
//!   directory fails, listing a missing directory fails, and a write either
//!   lands completely or not at all. It also supports queued picker results
//!   and injected failures.
//!
//! The user cancelling the picker is `Ok(None)`, never an error.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StorageError {
    fn io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            StorageError::NotFound(path.to_path_buf())
        } else {
            StorageError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// What a listed entry is, following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    /// Neither a regular file nor a directory: a dangling symlink, socket,
    /// device node, or anything whose metadata cannot be read.
    Other,
    /// The name is not valid UTF-8. `name` holds a lossy rendering for
    /// display only and does not address the entry.
    UnreadableName,
}

/// One entry directly under a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl DirEntry {
    pub fn new(name: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn file(name: impl Into<String>) -> Self {
        Self::new(name, EntryKind::File)
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self::new(name, EntryKind::Dir)
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

pub trait Storage {
    /// Ask the user for a site folder. `Ok(None)` means the user cancelled.
    fn pick_folder(&mut self) -> Result<Option<PathBuf>, StorageError>;

    /// Whether a file or directory exists at `path`.
    fn exists(&self, path: &Path) -> Result<bool, StorageError>;

    /// Whether `path` exists and is a directory.
    fn is_dir(&self, path: &Path) -> Result<bool, StorageError>;

    fn read_file(&self, path: &Path) -> Result<Vec<u8>, StorageError>;

    /// Write `bytes` to `path`, replacing any existing file. Atomic: on error
    /// the previous content (or absence) is preserved. The parent directory
    /// must exist.
    fn write_file(&mut self, path: &Path, bytes: &[u8]) -> Result<(), StorageError>;

    /// Copy a file byte-for-byte. The destination's parent must exist.
    fn copy_file(&mut self, src: &Path, dest: &Path) -> Result<(), StorageError>;

    /// Entries directly under `path`, sorted by name (ordinal). Errors if the
    /// directory does not exist. Entries whose names are not UTF-8 are listed
    /// as [`EntryKind::UnreadableName`].
    fn list_directory(&self, path: &Path) -> Result<Vec<DirEntry>, StorageError>;

    fn create_dir_all(&mut self, path: &Path) -> Result<(), StorageError>;

    fn remove_dir_all(&mut self, path: &Path) -> Result<(), StorageError>;
}

// =============================================================================
// Filesystem
// =============================================================================

/// The real filesystem, with a terminal prompt standing in for a folder picker.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStorage;

impl FsStorage {
    pub fn new() -> Self {
        Self
    }
}

impl Storage for FsStorage {
    fn pick_folder(&mut self) -> Result<Option<PathBuf>, StorageError> {
        let unavailable = |e: io::Error| StorageError::Unavailable(format!("folder prompt: {e}"));

        let mut stderr = io::stderr();
        write!(stderr, "Site folder (leave blank to cancel): ").map_err(unavailable)?;
        stderr.flush().map_err(unavailable)?;

        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line).map_err(unavailable)?;
        let answer = line.trim();
        if read == 0 || answer.is_empty() {
            return Ok(None);
        }
        let path = std::path::absolute(answer).map_err(unavailable)?;
        Ok(Some(path))
    }

    fn exists(&self, path: &Path) -> Result<bool, StorageError> {
        path.try_exists().map_err(|e| StorageError::io(path, e))
    }

    fn is_dir(&self, path: &Path) -> Result<bool, StorageError> {
        match fs::metadata(path) {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        fs::read(path).map_err(|e| StorageError::io(path, e))
    }

    fn write_file(&mut self, path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let err = |e: io::Error| StorageError::io(path, e);

        let mut tmp = NamedTempFile::new_in(parent).map_err(err)?;
        tmp.write_all(bytes).map_err(err)?;
        tmp.as_file().sync_all().map_err(err)?;
        tmp.persist(path).map_err(|e| err(e.error))?;
        debug!(path = %path.display(), bytes = bytes.len(), "wrote file");
        Ok(())
    }

    fn copy_file(&mut self, src: &Path, dest: &Path) -> Result<(), StorageError> {
        if !src.is_file() {
            return Err(StorageError::NotFound(src.to_path_buf()));
        }
        fs::copy(src, dest).map_err(|e| StorageError::io(dest, e))?;
        Ok(())
    }

    fn list_directory(&self, path: &Path) -> Result<Vec<DirEntry>, StorageError> {
        let err = |e: io::Error| StorageError::io(path, e);
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).map_err(err)? {
            let entry = entry.map_err(err)?;
            let entry = match entry.file_name().into_string() {
                Ok(name) => {
                    let kind = match fs::metadata(entry.path()) {
                        Ok(meta) if meta.is_file() => EntryKind::File,
                        Ok(meta) if meta.is_dir() => EntryKind::Dir,
                        _ => EntryKind::Other,
                    };
                    DirEntry::new(name, kind)
                }
                Err(raw) => DirEntry::new(raw.to_string_lossy(), EntryKind::UnreadableName),
            };
            entries.push(entry);
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn create_dir_all(&mut self, path: &Path) -> Result<(), StorageError> {
        fs::create_dir_all(path).map_err(|e| StorageError::io(path, e))
    }

    fn remove_dir_all(&mut self, path: &Path) -> Result<(), StorageError> {
        fs::remove_dir_all(path).map_err(|e| StorageError::io(path, e))?;
        debug!(path = %path.display(), "removed directory");
        Ok(())
    }
}

// =============================================================================
// In-memory
// =============================================================================

/// In-memory directory tree for tests.
///
/// Paths are used as given (no normalization), so fixtures should use
/// absolute paths such as `/site/index.html`.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    dirs: BTreeSet<PathBuf>,
    files: BTreeMap<PathBuf, Vec<u8>>,
    /// Entries that are neither files nor directories.
    special: BTreeMap<PathBuf, EntryKind>,
    selections: VecDeque<Option<PathBuf>>,
    failing_writes: BTreeSet<PathBuf>,
    unavailable: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, creating its parent directories.
    pub fn with_file(mut self, path: impl AsRef<Path>, bytes: impl AsRef<[u8]>) -> Self {
        self.put_file(path, bytes);
        self
    }

    /// Add an (empty) directory and its ancestors.
    pub fn with_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.insert_dir(path.as_ref());
        self
    }

    /// Add an entry that is neither a regular file nor a directory, such as
    /// a dangling symlink. It exists and is listed but cannot be read.
    pub fn with_special(mut self, path: impl AsRef<Path>, kind: EntryKind) -> Self {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.insert_dir(parent);
        }
        self.special.insert(path.to_path_buf(), kind);
        self
    }

    pub fn put_file(&mut self, path: impl AsRef<Path>, bytes: impl AsRef<[u8]>) {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.insert_dir(parent);
        }
        self.files.insert(path.to_path_buf(), bytes.as_ref().to_vec());
    }

    pub fn remove_file(&mut self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.files.remove(path.as_ref())
    }

    /// Queue the next picker result. An empty queue behaves as a cancel.
    pub fn queue_selection(&mut self, selection: Option<PathBuf>) {
        self.selections.push_back(selection);
    }

    /// Make every write or copy targeting `path` fail.
    pub fn fail_writes_to(&mut self, path: impl AsRef<Path>) {
        self.failing_writes.insert(path.as_ref().to_path_buf());
    }

    pub fn clear_failures(&mut self) {
        self.failing_writes.clear();
    }

    /// Simulate an unreachable backend: every operation fails.
    pub fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }

    pub fn file(&self, path: impl AsRef<Path>) -> Option<&[u8]> {
        self.files.get(path.as_ref()).map(Vec::as_slice)
    }

    /// All file paths under `root`, in path order.
    pub fn files_under(&self, root: impl AsRef<Path>) -> Vec<PathBuf> {
        let root = root.as_ref();
        self.files
            .keys()
            .filter(|p| p.starts_with(root))
            .cloned()
            .collect()
    }

    fn insert_dir(&mut self, path: &Path) {
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            self.dirs.insert(ancestor.to_path_buf());
        }
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable {
            Err(StorageError::Unavailable("in-memory storage offline".into()))
        } else {
            Ok(())
        }
    }

    fn check_writable(&self, path: &Path) -> Result<(), StorageError> {
        if self.dirs.contains(path) {
            return Err(StorageError::Io {
                path: path.to_path_buf(),
                source: io::Error::other("is a directory"),
            });
        }
        let parent_exists = path.parent().is_some_and(|p| self.dirs.contains(p));
        if !parent_exists {
            return Err(StorageError::NotFound(path.to_path_buf()));
        }
        if self.failing_writes.contains(path) {
            return Err(StorageError::Io {
                path: path.to_path_buf(),
                source: io::Error::other("injected write failure"),
            });
        }
        Ok(())
    }
}

impl Storage for MemoryStorage {
    fn pick_folder(&mut self) -> Result<Option<PathBuf>, StorageError> {
        self.check_available()?;
        Ok(self.selections.pop_front().flatten())
    }

    fn exists(&self, path: &Path) -> Result<bool, StorageError> {
        self.check_available()?;
        Ok(self.dirs.contains(path)
            || self.files.contains_key(path)
            || self.special.contains_key(path))
    }

    fn is_dir(&self, path: &Path) -> Result<bool, StorageError> {
        self.check_available()?;
        Ok(self.dirs.contains(path))
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        self.check_available()?;
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_path_buf()))
    }

    fn write_file(&mut self, path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
        self.check_available()?;
        self.check_writable(path)?;
        self.files.insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }

    fn copy_file(&mut self, src: &Path, dest: &Path) -> Result<(), StorageError> {
        self.check_available()?;
        let bytes = self
            .files
            .get(src)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(src.to_path_buf()))?;
        self.check_writable(dest)?;
        self.files.insert(dest.to_path_buf(), bytes);
        Ok(())
    }

    fn list_directory(&self, path: &Path) -> Result<Vec<DirEntry>, StorageError> {
        self.check_available()?;
        if !self.dirs.contains(path) {
            return Err(StorageError::NotFound(path.to_path_buf()));
        }
        let child_name = |p: &PathBuf| {
            (p.parent() == Some(path))
                .then(|| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                .flatten()
        };
        let mut entries: Vec<DirEntry> = self
            .dirs
            .iter()
            .filter_map(|d| child_name(d).map(DirEntry::dir))
            .chain(
                self.files
                    .keys()
                    .filter_map(|f| child_name(f).map(DirEntry::file)),
            )
            .chain(
                self.special
                    .iter()
                    .filter_map(|(p, kind)| child_name(p).map(|n| DirEntry::new(n, *kind))),
            )
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn create_dir_all(&mut self, path: &Path) -> Result<(), StorageError> {
        self.check_available()?;
        if let Some(file) = path.ancestors().find(|a| self.files.contains_key(*a)) {
            return Err(StorageError::Io {
                path: file.to_path_buf(),
                source: io::Error::other("not a directory"),
            });
        }
        if self.failing_writes.contains(path) {
            return Err(StorageError::Io {
                path: path.to_path_buf(),
                source: io::Error::other("injected write failure"),
            });
        }
        self.insert_dir(path);
        Ok(())
    }

    fn remove_dir_all(&mut self, path: &Path) -> Result<(), StorageError> {
        self.check_available()?;
        if !self.dirs.contains(path) {
            return Err(StorageError::NotFound(path.to_path_buf()));
        }
        if self.failing_writes.contains(path) {
            return Err(StorageError::Io {
                path: path.to_path_buf(),
                source: io::Error::other("injected write failure"),
            });
        }
        self.dirs.retain(|d| !d.starts_with(path));
        self.files.retain(|f, _| !f.starts_with(path));
        self.special.retain(|f, _| !f.starts_with(path));
        Ok(())
    }
}
