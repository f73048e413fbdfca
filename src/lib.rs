//! # Shelfkeeper
//!
//! Local tooling for a static "reading list" website. A site is a folder
//! holding a few template files, a `config.json`, and book records as JSON
//! files grouped into shelf folders. Shelfkeeper finds and prepares such a
//! folder, remembers it as the active site, and builds a deployable bundle.
//!
//! # Architecture
//!
//! ```text
//! Setup    folder  →  validate  →  initialize  →  active site (settings)
//! Build    books/<shelf>/*.json + templates  →  dist/ + dist/books/index.json
//! ```
//!
//! Every component that touches a site goes through the [`storage::Storage`]
//! trait, so the whole flow runs against an in-memory tree in tests and the
//! real filesystem in the CLI.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`layout`] | Fixed file and folder names of a site |
//! | [`storage`] | Folder picking and raw file I/O: filesystem and in-memory backends |
//! | [`validate`] | Classifies a folder as ready, needing initialization, or invalid |
//! | [`provision`] | Creates missing `config.json` / `books/` and activates a ready site |
//! | [`settings`] | Persisted app settings: which site is active |
//! | [`repository`] | The settings repository seam used by setup |
//! | [`workflow`] | Setup state machine and its driver |
//! | [`config`] | Site `config.json`: loading, validation, editing, shelf identity |
//! | [`build`] | Content build pipeline: shelves → bundle + manifest |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Validation Is Not an Error
//!
//! A folder missing its template files is an ordinary answer from
//! [`validate::validate`], not a failure. Errors are reserved for the storage
//! backend itself failing, so the setup workflow can show the user what is
//! missing instead of aborting.
//!
//! ## Activation Needs Proof
//!
//! A site becomes active only through [`provision::activate`], which takes a
//! [`validate::ReadySite`]. That token can only be built from a validation
//! where everything is present, so a half-provisioned site can never be
//! recorded as active.
//!
//! ## Clean Builds
//!
//! Every build deletes the previous bundle first. The manifest is derived
//! purely from the books on disk, sorted, so identical input always produces
//! byte-identical output and removed books never linger.

pub mod build;
pub mod config;
pub mod layout;
pub mod output;
pub mod provision;
pub mod repository;
pub mod settings;
pub mod storage;
pub mod validate;
pub mod workflow;

#[cfg(test)]
pub(crate) mod test_helpers;
