//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Output leads with what the user cares about (site readiness, shelves,
//! book counts) and shows filesystem paths as indented secondary lines.
//! Warnings are listed last, after the summary they qualify.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Site /home/me/reading
//!     Template files: ok
//!     config.json: missing
//!     books/: missing
//! Needs initialization (will create: config.json, books)
//! ```
//!
//! ## Build
//!
//! ```text
//! Shelves (real data)
//! 001 Top 5 Reads (2 books)
//!     Source: top-5-reads/
//! 002 Good Reads (folder missing)
//!     Source: good-reads/
//!
//! Bundle /home/me/reading/dist
//!     index.html
//!     styles-minimalist.css
//!     app.js
//!     books/index.json (2 entries, sha256 3f2a…)
//!
//! Warnings
//!     Folder not found for shelf 'good-reads': /home/me/reading/books/good-reads
//!
//! Built 2 books from 2 shelves
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::build::BuildReport;
use crate::config::Config;
use crate::layout;
use crate::provision::InitReport;
use crate::validate::{Readiness, SiteValidation};
use crate::workflow::SetupState;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn presence(present: bool) -> &'static str {
    if present { "ok" } else { "missing" }
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Format a validation result for the `check` command.
pub fn format_validation(site: &Path, validation: &SiteValidation) -> Vec<String> {
    let mut lines = vec![format!("Site {}", site.display())];

    if validation.has_template_files {
        lines.push(format!("{}Template files: ok", indent(1)));
    } else {
        lines.push(format!(
            "{}Template files: missing {}",
            indent(1),
            validation.missing_files.join(", ")
        ));
    }
    lines.push(format!(
        "{}{}: {}",
        indent(1),
        layout::CONFIG_FILE,
        presence(validation.has_config)
    ));
    lines.push(format!(
        "{}{}/: {}",
        indent(1),
        layout::BOOKS_DIR,
        presence(validation.has_books)
    ));

    lines.push(match validation.readiness() {
        Readiness::Ready => "Ready".to_string(),
        Readiness::NeedsInitialization => format!(
            "Needs initialization (will create: {})",
            validation.will_create().join(", ")
        ),
        Readiness::Invalid => "Not a site folder".to_string(),
    });
    lines
}

pub fn print_validation(site: &Path, validation: &SiteValidation) {
    print_lines(format_validation(site, validation));
}

// ============================================================================
// Init
// ============================================================================

pub fn format_init_report(site: &Path, report: &InitReport) -> Vec<String> {
    let mut lines = vec![format!("Site {}", site.display())];
    if report.is_noop() {
        lines.push(format!("{}Already initialized", indent(1)));
    } else {
        for item in report.created() {
            lines.push(format!("{}Created {}", indent(1), item));
        }
    }
    lines
}

pub fn print_init_report(site: &Path, report: &InitReport) {
    print_lines(format_init_report(site, report));
}

// ============================================================================
// Build
// ============================================================================

/// Format a finished build: shelves, bundle contents, warnings, summary.
pub fn format_build_report(report: &BuildReport) -> Vec<String> {
    let mut lines = vec![format!("Shelves ({} data)", report.paths.data_source)];

    for (i, shelf) in report.shelves.iter().enumerate() {
        let detail = if shelf.found {
            plural(shelf.books, "book", "books")
        } else {
            "folder missing".to_string()
        };
        lines.push(format!("{} {} ({})", format_index(i + 1), shelf.label, detail));
        lines.push(format!("{}Source: {}/", indent(1), shelf.folder));
    }

    lines.push(String::new());
    lines.push(format!("Bundle {}", report.paths.bundle.display()));
    for file in &report.static_files {
        lines.push(format!("{}{}", indent(1), file));
    }
    lines.push(format!(
        "{}{}/{} ({}, sha256 {})",
        indent(1),
        layout::BOOKS_DIR,
        layout::MANIFEST_FILE,
        plural(report.manifest.len(), "entry", "entries"),
        short_digest(&report.manifest_digest)
    ));

    if !report.warnings.is_empty() {
        lines.push(String::new());
        lines.push("Warnings".to_string());
        for warning in &report.warnings {
            lines.push(format!("{}{}", indent(1), warning));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Built {} from {}",
        plural(report.manifest.len(), "book", "books"),
        plural(report.shelves.len(), "shelf", "shelves")
    ));
    lines
}

pub fn print_build_report(report: &BuildReport) {
    print_lines(format_build_report(report));
}

fn short_digest(digest: &str) -> &str {
    digest.get(..12).unwrap_or(digest)
}

// ============================================================================
// Config
// ============================================================================

pub fn format_config(config: &Config) -> Vec<String> {
    let text = |value: &str| {
        if value.is_empty() {
            "(empty)".to_string()
        } else {
            value.to_string()
        }
    };
    let mut lines = vec![
        format!("Title: {}", text(&config.site_title)),
        format!("Subtitle: {}", text(&config.site_subtitle)),
        format!("Footer: {}", text(&config.footer_text)),
        String::new(),
        "Shelves".to_string(),
    ];
    for (i, shelf) in config.shelves.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), shelf.label));
        lines.push(format!("{}Id: {}", indent(1), shelf.id));
        lines.push(format!("{}Folder: {}/", indent(1), shelf.folder));
    }
    lines
}

pub fn print_config(config: &Config) {
    print_lines(format_config(config));
}

// ============================================================================
// Setup
// ============================================================================

/// Describe where the setup workflow is waiting and what the user can do.
pub fn format_setup_state(state: &SetupState) -> Vec<String> {
    let mut lines = Vec::new();
    match state {
        SetupState::Welcome { error } => {
            lines.push("No site selected".to_string());
            if let Some(error) = error {
                lines.push(format!("{}Error: {}", indent(1), error));
            }
        }
        SetupState::SelectingPath => lines.push("Waiting for a folder".to_string()),
        SetupState::Validating { path } => lines.push(format!("Checking {}", path.display())),
        SetupState::NeedsInitialization {
            path,
            validation,
            error,
        } => {
            lines.push(format!("Site {} needs initialization", path.display()));
            lines.push(format!(
                "{}Will create: {}",
                indent(1),
                validation.will_create().join(", ")
            ));
            if let Some(error) = error {
                lines.push(format!("{}Error: {}", indent(1), error));
            }
        }
        SetupState::Invalid { path, validation } => {
            lines.push(format!("{} is not a site folder", path.display()));
            lines.push(format!(
                "{}Missing: {}",
                indent(1),
                validation.missing_files.join(", ")
            ));
        }
        SetupState::Initializing { path, .. } => {
            lines.push(format!("Initializing {}", path.display()))
        }
        SetupState::Active { path } => lines.push(format!("Active site: {}", path.display())),
    }
    lines
}

pub fn print_setup_state(state: &SetupState) {
    print_lines(format_setup_state(state));
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{BuildManifest, BuildPaths, BuildWarning, DataSource, ShelfSummary};
    use crate::config::Shelf;
    use std::path::PathBuf;

    fn validation(templates: bool, config: bool, books: bool) -> SiteValidation {
        SiteValidation {
            is_valid: templates,
            has_template_files: templates,
            has_config: config,
            has_books: books,
            missing_files: if templates {
                vec![]
            } else {
                vec!["app.js".to_string()]
            },
        }
    }

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn validation_needs_initialization() {
        let lines = format_validation(Path::new("/site"), &validation(true, false, false));
        assert_eq!(
            lines,
            vec![
                "Site /site",
                "    Template files: ok",
                "    config.json: missing",
                "    books/: missing",
                "Needs initialization (will create: config.json, books)",
            ]
        );
    }

    #[test]
    fn validation_invalid_lists_missing_templates() {
        let lines = format_validation(Path::new("/site"), &validation(false, false, false));
        assert_eq!(lines[1], "    Template files: missing app.js");
        assert_eq!(lines.last().unwrap(), "Not a site folder");
    }

    #[test]
    fn validation_ready() {
        let lines = format_validation(Path::new("/site"), &validation(true, true, true));
        assert_eq!(lines.last().unwrap(), "Ready");
    }

    #[test]
    fn init_report_lists_created_items() {
        let report = InitReport {
            created_config: true,
            created_books: false,
        };
        assert_eq!(
            format_init_report(Path::new("/site"), &report),
            vec!["Site /site", "    Created config.json"]
        );
        assert_eq!(
            format_init_report(Path::new("/site"), &InitReport::default())[1],
            "    Already initialized"
        );
    }

    #[test]
    fn build_report_shows_shelves_bundle_and_warnings() {
        let report = BuildReport {
            manifest: BuildManifest {
                entries: vec!["top-5-reads/a.json".into()],
            },
            shelves: vec![
                ShelfSummary {
                    id: "top-5-reads".into(),
                    label: "Top 5 Reads".into(),
                    folder: "top-5-reads".into(),
                    books: 1,
                    found: true,
                },
                ShelfSummary {
                    id: "good-reads".into(),
                    label: "Good Reads".into(),
                    folder: "good-reads".into(),
                    books: 0,
                    found: false,
                },
            ],
            warnings: vec![BuildWarning::MissingShelf {
                shelf: "good-reads".into(),
                folder: PathBuf::from("/site/books/good-reads"),
            }],
            paths: BuildPaths::for_site(Path::new("/site"), DataSource::Sample),
            static_files: vec!["index.html".into()],
            manifest_digest: "0123456789abcdef".into(),
        };
        let lines = format_build_report(&report);
        assert_eq!(
            lines,
            vec![
                "Shelves (sample data)",
                "001 Top 5 Reads (1 book)",
                "    Source: top-5-reads/",
                "002 Good Reads (folder missing)",
                "    Source: good-reads/",
                "",
                "Bundle /site/dist",
                "    index.html",
                "    books/index.json (1 entry, sha256 0123456789ab)",
                "",
                "Warnings",
                "    Folder not found for shelf 'good-reads': /site/books/good-reads",
                "",
                "Built 1 book from 2 shelves",
            ]
        );
    }

    #[test]
    fn config_shows_empty_text_and_shelves() {
        let config = Config {
            site_title: "Reading".into(),
            site_subtitle: String::new(),
            footer_text: String::new(),
            shelves: vec![Shelf::new("good-reads", "Good Reads", "good-reads")],
        };
        assert_eq!(
            format_config(&config),
            vec![
                "Title: Reading",
                "Subtitle: (empty)",
                "Footer: (empty)",
                "",
                "Shelves",
                "001 Good Reads",
                "    Id: good-reads",
                "    Folder: good-reads/",
            ]
        );
    }

    #[test]
    fn setup_state_welcome_with_error() {
        let state = SetupState::Welcome {
            error: Some("disk offline".into()),
        };
        assert_eq!(
            format_setup_state(&state),
            vec!["No site selected", "    Error: disk offline"]
        );
    }

    #[test]
    fn setup_state_invalid_lists_missing() {
        let state = SetupState::Invalid {
            path: PathBuf::from("/tmp/photos"),
            validation: validation(false, false, false),
        };
        assert_eq!(
            format_setup_state(&state),
            vec!["/tmp/photos is not a site folder", "    Missing: app.js"]
        );
    }

    #[test]
    fn short_digest_handles_short_input() {
        assert_eq!(short_digest("abc"), "abc");
    }
}
