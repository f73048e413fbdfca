//! Setup workflow state machine.
//!
//! Guides the user from "no site selected" to an active site. The state
//! machine is split in two:
//!
//! - [`transition`]: a pure function from `(state, event)` to the next state
//!   plus at most one [`Effect`] to perform. No I/O, so every path through the
//!   machine is testable without storage.
//! - [`SetupWorkflow`]: the driver. It feeds user actions in, runs effects
//!   against a [`SettingsRepository`], and feeds their results back in until
//!   the machine settles in a state that waits for the user.
//!
//! # State Flow
//!
//! ```text
//! Welcome ──select──▶ SelectingPath ──cancel──▶ Welcome
//!                          │ path
//!                          ▼
//!                      Validating ──all present──▶ (activate) ──▶ Active
//!                       │      │
//!          templates ok,│      │templates missing
//!          data missing ▼      ▼
//!          NeedsInitialization  Invalid
//!            │  ▲       │          │
//!  initialize│  │failure│          │
//!            ▼  │       └─choose different─┴──▶ Welcome
//!          Initializing ──ready──▶ (activate) ──▶ Active
//! ```
//!
//! The pending path and validation live inside the state variants, so there
//! is never more than one of each, and returning to `Welcome` or reaching
//! `Active` drops them. `Active` can only be reached through an `Activate`
//! effect, which needs a [`ReadySite`].
//!
//! Storage failures never escape the driver as errors: they are surfaced in
//! the state (`Welcome { error }` or `NeedsInitialization { error }`) so the
//! user can retry. [`WorkflowError`] is reserved for actions that make no
//! sense in the current state.

use crate::provision;
use crate::repository::SettingsRepository;
use crate::validate::{Readiness, ReadySite, SiteValidation};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupState {
    /// Waiting for the user to pick a folder. Carries the last failure, if any.
    Welcome { error: Option<String> },
    /// Folder picker is open.
    SelectingPath,
    /// Checking the picked folder (transient).
    Validating { path: PathBuf },
    /// Template files present, config or books folder missing.
    NeedsInitialization {
        path: PathBuf,
        validation: SiteValidation,
        error: Option<String>,
    },
    /// Template files missing.
    Invalid {
        path: PathBuf,
        validation: SiteValidation,
    },
    /// Creating missing data (transient).
    Initializing {
        path: PathBuf,
        validation: SiteValidation,
    },
    /// Site activated. Terminal.
    Active { path: PathBuf },
}

impl SetupState {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Welcome { .. } => "Welcome",
            Self::SelectingPath => "SelectingPath",
            Self::Validating { .. } => "Validating",
            Self::NeedsInitialization { .. } => "NeedsInitialization",
            Self::Invalid { .. } => "Invalid",
            Self::Initializing { .. } => "Initializing",
            Self::Active { .. } => "Active",
        }
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    /// The folder under consideration, if any.
    pub fn pending_path(&self) -> Option<&Path> {
        match self {
            Self::Validating { path }
            | Self::NeedsInitialization { path, .. }
            | Self::Invalid { path, .. }
            | Self::Initializing { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn pending_validation(&self) -> Option<&SiteValidation> {
        match self {
            Self::NeedsInitialization { validation, .. }
            | Self::Invalid { validation, .. }
            | Self::Initializing { validation, .. } => Some(validation),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Welcome { error } | Self::NeedsInitialization { error, .. } => error.as_deref(),
            _ => None,
        }
    }
}

impl Default for SetupState {
    fn default() -> Self {
        Self::Welcome { error: None }
    }
}

impl fmt::Display for SetupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// User actions and effect results fed into [`transition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupEvent {
    SelectFolder,
    FolderPicked(Result<Option<PathBuf>, String>),
    Validated(Result<SiteValidation, String>),
    Initialize,
    /// Initialization finished; carries the re-validation of the folder.
    Initialized(Result<SiteValidation, String>),
    Activated(Result<(), String>),
    ChooseDifferent,
}

impl SetupEvent {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SelectFolder => "SelectFolder",
            Self::FolderPicked(_) => "FolderPicked",
            Self::Validated(_) => "Validated",
            Self::Initialize => "Initialize",
            Self::Initialized(_) => "Initialized",
            Self::Activated(_) => "Activated",
            Self::ChooseDifferent => "ChooseDifferent",
        }
    }
}

/// Work the driver must do before the next event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    PickFolder,
    Validate(PathBuf),
    Initialize(PathBuf),
    Activate(ReadySite),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub state: SetupState,
    pub effect: Option<Effect>,
}

impl Step {
    fn to(state: SetupState) -> Self {
        Self {
            state,
            effect: None,
        }
    }

    fn with(state: SetupState, effect: Effect) -> Self {
        Self {
            state,
            effect: Some(effect),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Cannot {event} while in {state}")]
    InvalidTransition {
        state: &'static str,
        event: &'static str,
    },
}

/// Where a fresh validation result leads.
fn after_validation(path: &Path, validation: SiteValidation, stay: SetupState) -> Step {
    if let Some(site) = ReadySite::from_validation(path, &validation) {
        return Step::with(stay, Effect::Activate(site));
    }
    let path = path.to_path_buf();
    if validation.is_valid {
        Step::to(SetupState::NeedsInitialization {
            path,
            validation,
            error: None,
        })
    } else {
        Step::to(SetupState::Invalid { path, validation })
    }
}

/// Compute the next state for `event`. Pure.
pub fn transition(state: &SetupState, event: SetupEvent) -> Result<Step, WorkflowError> {
    use SetupEvent as E;
    use SetupState as S;

    let invalid = |event: &SetupEvent| WorkflowError::InvalidTransition {
        state: state.name(),
        event: event.name(),
    };

    let step = match (state, event) {
        (S::Welcome { .. }, E::SelectFolder) => Step::with(S::SelectingPath, Effect::PickFolder),

        (S::SelectingPath, E::FolderPicked(Ok(None))) => Step::to(S::Welcome { error: None }),
        (S::SelectingPath, E::FolderPicked(Ok(Some(path)))) => Step::with(
            S::Validating { path: path.clone() },
            Effect::Validate(path),
        ),
        (S::SelectingPath, E::FolderPicked(Err(error))) => Step::to(S::Welcome {
            error: Some(error),
        }),

        (S::Validating { path }, E::Validated(Ok(validation))) => {
            after_validation(path, validation, state.clone())
        }
        (S::Validating { .. }, E::Validated(Err(error))) => Step::to(S::Welcome {
            error: Some(error),
        }),

        (S::NeedsInitialization {
            path, validation, ..
        }, E::Initialize) => Step::with(
            S::Initializing {
                path: path.clone(),
                validation: validation.clone(),
            },
            Effect::Initialize(path.clone()),
        ),

        (S::Initializing { path, .. }, E::Initialized(Ok(validation))) => {
            if validation.readiness() == Readiness::NeedsInitialization {
                Step::to(S::NeedsInitialization {
                    path: path.clone(),
                    validation,
                    error: Some("site data is still incomplete after initialization".into()),
                })
            } else {
                after_validation(path, validation, state.clone())
            }
        }
        (S::Initializing { path, validation }, E::Initialized(Err(error))) => {
            Step::to(S::NeedsInitialization {
                path: path.clone(),
                validation: validation.clone(),
                error: Some(error),
            })
        }

        (S::Validating { path } | S::Initializing { path, .. }, E::Activated(Ok(()))) => {
            Step::to(S::Active { path: path.clone() })
        }
        (S::Validating { .. }, E::Activated(Err(error))) => Step::to(S::Welcome {
            error: Some(error),
        }),
        (S::Initializing { path, validation }, E::Activated(Err(error))) => {
            Step::to(S::NeedsInitialization {
                path: path.clone(),
                validation: validation.clone(),
                error: Some(error),
            })
        }

        (S::Invalid { .. } | S::NeedsInitialization { .. }, E::ChooseDifferent) => {
            Step::to(S::Welcome { error: None })
        }

        (_, event) => return Err(invalid(&event)),
    };
    Ok(step)
}

/// Runs the setup state machine against a repository.
#[derive(Debug)]
pub struct SetupWorkflow<R: SettingsRepository> {
    repo: R,
    state: SetupState,
}

impl<R: SettingsRepository> SetupWorkflow<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            state: SetupState::default(),
        }
    }

    pub fn state(&self) -> &SetupState {
        &self.state
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn repo_mut(&mut self) -> &mut R {
        &mut self.repo
    }

    pub fn into_repo(self) -> R {
        self.repo
    }

    /// Open the folder picker and classify the result.
    pub fn select_folder(&mut self) -> Result<&SetupState, WorkflowError> {
        self.dispatch(SetupEvent::SelectFolder)
    }

    /// Create missing data for the pending folder, then activate it.
    pub fn initialize(&mut self) -> Result<&SetupState, WorkflowError> {
        self.dispatch(SetupEvent::Initialize)
    }

    /// Drop the pending folder and go back to the start.
    pub fn choose_different(&mut self) -> Result<&SetupState, WorkflowError> {
        self.dispatch(SetupEvent::ChooseDifferent)
    }

    fn dispatch(&mut self, event: SetupEvent) -> Result<&SetupState, WorkflowError> {
        let mut step = transition(&self.state, event)?;
        loop {
            debug!(from = self.state.name(), to = step.state.name(), "setup transition");
            self.state = step.state;
            let Some(effect) = step.effect else {
                break;
            };
            let event = self.run(effect);
            step = transition(&self.state, event)?;
        }
        Ok(&self.state)
    }

    fn run(&mut self, effect: Effect) -> SetupEvent {
        match effect {
            Effect::PickFolder => {
                SetupEvent::FolderPicked(self.repo.select_site_path().map_err(|e| e.to_string()))
            }
            Effect::Validate(path) => SetupEvent::Validated(
                self.repo
                    .validate_site_path(&path)
                    .map_err(|e| e.to_string()),
            ),
            Effect::Initialize(path) => SetupEvent::Initialized(
                self.repo
                    .initialize_site_data(&path)
                    .and_then(|_| self.repo.validate_site_path(&path))
                    .map_err(|e| e.to_string()),
            ),
            Effect::Activate(site) => SetupEvent::Activated(
                provision::activate(&mut self.repo, site)
                    .map(|_| ())
                    .map_err(|e| e.to_string()),
            ),
        }
    }
}
