//! The three things a batch run can do to a directory.
//!
//! Every action shares one contract, [`Action::execute`]: expected problems
//! with a package become a [`Classification::Failed`](crate::Classification)
//! outcome, and only non-domain errors are returned as `Err`.

mod clean;
mod create;
mod validate;

use crate::error::{ErrorKind, Result};
use crate::options::RunConfiguration;
use crate::outcome::{ActionOutcome, OutcomeBuilder};
use derive_more::Display;
use exn::ResultExt;
use grabbags_bagit::PackagerHandle;
use grabbags_bagit::error::Result as PackageResult;
use serde::Serialize;
use std::path::Path;

pub use self::clean::CleanAction;
pub use self::create::CreateAction;
pub use self::validate::{ValidateAction, ValidationMode};

/// Selects the action for a whole run. Runs never mix kinds.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    #[default]
    #[display("create")]
    Create,
    #[display("validate")]
    Validate,
    #[display("clean")]
    Clean,
}

impl ActionKind {
    /// Past participle used in summaries: "3 bags validated successfully".
    pub fn verb(self) -> &'static str {
        match self {
            Self::Create => "created",
            Self::Validate => "validated",
            Self::Clean => "cleaned",
        }
    }

    /// Log phrase for a package error that escaped its action.
    pub fn failure_phrase(self) -> &'static str {
        match self {
            Self::Create => "could not be bagged",
            Self::Validate => "is invalid",
            Self::Clean => "cannot be cleaned",
        }
    }

    /// Instantiates the action for this kind on top of `packager`.
    pub fn action(self, packager: PackagerHandle) -> Box<dyn Action + Send + Sync> {
        match self {
            Self::Create => Box::new(CreateAction::new(packager)),
            Self::Validate => Box::new(ValidateAction::new(packager)),
            Self::Clean => Box::new(CleanAction::new(packager)),
        }
    }
}

pub trait Action {
    fn kind(&self) -> ActionKind;

    /// Runs the action against the directory at `path`.
    ///
    /// # Errors
    /// Only errors that are not [domain](crate::error::ErrorKind::is_domain)
    /// errors are returned; those abort the batch.
    fn execute(&self, path: &Path, config: &RunConfiguration) -> Result<ActionOutcome>;
}

/// Splits a package result into the part a single directory absorbs and the
/// part that aborts the run.
///
/// Domain errors come back as `Ok(Err(reason))`; anything else is raised as
/// [`ErrorKind::Package`].
pub(crate) fn isolate<T>(result: PackageResult<T>) -> Result<std::result::Result<T, String>> {
    match result {
        Ok(value) => Ok(Ok(value)),
        Err(e) if e.is_domain() => Ok(Err((*e).to_string())),
        Err(e) => {
            let kind = (*e).clone();
            Err(e).or_raise(|| ErrorKind::Package(kind))
        },
    }
}

/// Logs a per-directory failure with the wording for `kind` and classifies it.
pub(crate) fn fail(kind: ActionKind, outcome: OutcomeBuilder, path: &Path, reason: String) -> ActionOutcome {
    tracing::error!(action = %kind, "{} {}: {reason}", path.display(), kind.failure_phrase());
    outcome.failed(reason)
}
