//! Batch processing of package directories.
//!
//! A run applies one [`ActionKind`] to every immediate subdirectory of one or
//! more parent directories and sorts each into a bucket of the resulting
//! [`BatchResult`]:
//!
//! - **succeeded**: the package was created, validated or cleaned.
//! - **failed**: the package-format collaborator rejected it. The run
//!   carries on with the next directory.
//! - **not a package**: validate and clean leave plain directories alone.
//! - **skipped**: create leaves empty directories and existing packages
//!   alone.
//!
//! Package operations go through a [`PackagerHandle`](grabbags_bagit::PackagerHandle),
//! so the engine can be driven by a scripted packager in tests.

pub mod action;
mod artifact;
pub mod desktop;
mod detect;
pub mod error;
mod options;
mod outcome;
mod report;
mod runner;

pub use crate::action::{Action, ActionKind, CleanAction, CreateAction, ValidateAction, ValidationMode};
pub use crate::artifact::{is_system_artifact, strip_system_artifacts};
pub use crate::detect::is_package;
pub use crate::options::{Options, Plan, RunConfiguration};
pub use crate::outcome::{ActionOutcome, Classification, Detail, OutcomeBuilder, detail};
pub use crate::report::Report;
pub use crate::runner::{BatchResult, BatchRunner};
