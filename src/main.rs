use clap::{Args, Parser, Subcommand};
use shelfkeeper::build::{self, BuildPaths, DataSource};
use shelfkeeper::config::{self, ConfigEdit};
use shelfkeeper::output;
use shelfkeeper::provision;
use shelfkeeper::repository::{SettingsRepository, StorageRepository};
use shelfkeeper::settings::SettingsStore;
use shelfkeeper::storage::FsStorage;
use shelfkeeper::validate::ReadySite;
use shelfkeeper::workflow::{SetupState, SetupWorkflow};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::EnvFilter;

type Repo = StorageRepository<FsStorage>;

#[derive(Parser)]
#[command(name = "shelfkeeper")]
#[command(about = "Set up and build a personal reading-list site")]
#[command(long_about = "\
Set up and build a personal reading-list site

A site is a folder with a few template files, a config.json, and one folder
of book records per shelf. Setup remembers the folder as the active site;
build turns it into a deployable dist/ folder.

Site structure:

  site/
  ├── index.html                   # Template files (required)
  ├── styles-minimalist.css
  ├── app.js
  ├── favicon.ico                  # Optional, copied if present
  ├── config.json                  # Title, subtitle, footer, shelves
  ├── books/                       # Book records (JSON), one folder per shelf
  │   ├── top-5-reads/
  │   ├── good-reads/
  │   └── current-and-future-reads/
  ├── books-sample/                # Sample records (build --sample)
  └── dist/                        # Build output, cleared on every build

Log verbosity follows RUST_LOG (default: warn).")]
#[command(version)]
struct Cli {
    /// Settings file recording the active site
    /// [default: $HOME/.config/shelfkeeper/settings.json]
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the deployable bundle into <site>/dist
    Build(BuildArgs),
    /// Report whether a folder is a site and what it is missing
    Check {
        /// Folder to inspect
        path: PathBuf,
    },
    /// Create missing config.json and books/, then make the folder the active site
    Init {
        /// Site folder
        path: PathBuf,
    },
    /// Interactively choose, prepare, and activate a site folder
    Setup,
    /// View or edit the active site's config.json
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Args)]
struct BuildArgs {
    /// Site folder (defaults to the active site)
    #[arg(long)]
    site: Option<PathBuf>,

    /// Read books from books-sample/ instead of books/
    #[arg(long)]
    sample: bool,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the site title, subtitle, footer, and shelves
    Show,
    /// Change site text; shelves cannot be changed here
    Set {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        subtitle: Option<String>,
        #[arg(long)]
        footer: Option<String>,
    },
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let store = match cli.settings {
        Some(path) => SettingsStore::new(path),
        None => SettingsStore::at_default_location()?,
    };
    let mut repo = StorageRepository::new(FsStorage::new(), store);

    match cli.command {
        Command::Build(args) => {
            let site = match args.site {
                Some(site) => site,
                None => active_site(&repo)?,
            };
            let data_source = if args.sample {
                DataSource::Sample
            } else {
                DataSource::Real
            };
            let shelves = match config::load_optional(repo.storage(), &site)? {
                Some(config) => config.shelves,
                None => {
                    warn!(site = %site.display(), "no config.json, using default shelves");
                    config::default_shelves()
                }
            };
            let paths = BuildPaths::for_site(&site, data_source);
            let report = build::build(repo.storage_mut(), &paths, &shelves)?;
            output::print_build_report(&report);
        }
        Command::Check { path } => {
            let path = std::path::absolute(&path)?;
            let validation = repo.validate_site_path(&path)?;
            output::print_validation(&path, &validation);
        }
        Command::Init { path } => {
            let path = std::path::absolute(&path)?;
            let report = repo.initialize_site_data(&path)?;
            output::print_init_report(&path, &report);
            let validation = repo.validate_site_path(&path)?;
            let site = ReadySite::from_validation(&path, &validation)
                .ok_or("site is still incomplete after initialization")?;
            provision::activate(&mut repo, site)?;
            println!("Active site: {}", path.display());
        }
        Command::Setup => run_setup(repo)?,
        Command::Config(ConfigCommand::Show) => {
            let site = active_site(&repo)?;
            let config = config::load(repo.storage(), &site)?;
            output::print_config(&config);
        }
        Command::Config(ConfigCommand::Set {
            title,
            subtitle,
            footer,
        }) => {
            let edit = ConfigEdit {
                site_title: title,
                site_subtitle: subtitle,
                footer_text: footer,
            };
            if edit.is_empty() {
                return Err("nothing to change; pass --title, --subtitle, or --footer".into());
            }
            let site = active_site(&repo)?;
            let config = config::apply_edit(repo.storage_mut(), &site, &edit)?;
            output::print_config(&config);
        }
    }

    Ok(())
}

/// Install the stderr log subscriber. `RUST_LOG` overrides the `warn` default.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .init();
}

fn active_site(repo: &Repo) -> Result<PathBuf, Box<dyn std::error::Error>> {
    repo.get()?
        .library_path
        .ok_or_else(|| "no active site; run `shelfkeeper setup` or pass a site folder".into())
}

/// Drive the setup workflow from the terminal until a site is active or the
/// user gives up.
fn run_setup(repo: Repo) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(current) = repo.get()?.library_path {
        println!("Current site: {}", current.display());
    }
    let mut workflow = SetupWorkflow::new(repo);

    loop {
        match workflow.state().clone() {
            SetupState::Welcome { .. } => {
                let state = workflow.select_folder()?;
                if let SetupState::Welcome { error } = state {
                    return match error {
                        Some(error) => Err(error.clone().into()),
                        None => {
                            println!("Setup cancelled; active site unchanged");
                            Ok(())
                        }
                    };
                }
                output::print_setup_state(state);
            }
            SetupState::NeedsInitialization { .. } => {
                if confirm("Create the missing files? [Y/n] ")? {
                    output::print_setup_state(workflow.initialize()?);
                } else {
                    workflow.choose_different()?;
                }
            }
            SetupState::Invalid { .. } => {
                if confirm("Choose a different folder? [Y/n] ")? {
                    workflow.choose_different()?;
                } else {
                    return Err("setup abandoned: folder is not a site".into());
                }
            }
            SetupState::Active { .. } => return Ok(()),
            other => return Err(format!("setup stopped in state {other}").into()),
        }
    }
}

/// Ask a yes/no question on stderr. Blank means yes; end of input means no.
fn confirm(question: &str) -> io::Result<bool> {
    let mut stderr = io::stderr();
    write!(stderr, "{question}")?;
    stderr.flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(false);
    }
    Ok(matches!(
        line.trim().to_ascii_lowercase().as_str(),
        "" | "y" | "yes"
    ))
}
