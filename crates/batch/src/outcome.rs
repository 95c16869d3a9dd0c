//! Per-directory results.
//!
//! An [`OutcomeBuilder`] is opened when an action starts on a directory,
//! collects [`Detail`]s while the action runs, and is consumed by exactly one
//! of its terminal methods. The resulting [`ActionOutcome`] cannot be changed.

use derive_more::Display;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Well-known detail keys.
pub mod detail {
    /// The directory had no entries (create).
    pub const EMPTY_DIRECTORY: &str = "empty_directory";
    /// The directory was already a package (create).
    pub const ALREADY_A_PACKAGE: &str = "already_a_package";
    /// Text of the error that failed the directory.
    pub const ERROR: &str = "error";
    /// System artifacts deleted before bagging (create) or from the payload
    /// (clean).
    pub const REMOVED: &str = "removed";
    /// How thoroughly the package was checked (validate).
    pub const VALIDATION_MODE: &str = "validation_mode";
    /// Payload files left in place because they are not artifacts (clean).
    pub const UNMANIFESTED: &str = "unmanifested";
    /// Every payload file was already in the manifest (clean).
    pub const ALREADY_CLEAN: &str = "already_clean";
}

/// Which result bucket a directory belongs to.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    #[display("succeeded")]
    Succeeded,
    #[display("failed")]
    Failed,
    #[display("not a package")]
    NotAPackage,
    #[display("skipped")]
    Skipped,
}

/// A single action-specific fact about an outcome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Detail {
    Flag,
    Count(usize),
    Text(String),
    Paths(Vec<PathBuf>),
}

impl Detail {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_paths(&self) -> Option<&[PathBuf]> {
        match self {
            Self::Paths(paths) => Some(paths),
            _ => None,
        }
    }

    /// Numeric size of the detail: counts as-is, path lists by length.
    pub fn count(&self) -> usize {
        match self {
            Self::Flag => 1,
            Self::Count(n) => *n,
            Self::Text(_) => 1,
            Self::Paths(paths) => paths.len(),
        }
    }
}

/// The immutable result of running one action against one directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActionOutcome {
    path: PathBuf,
    classification: Classification,
    details: BTreeMap<String, Detail>,
}

impl ActionOutcome {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn classification(&self) -> Classification {
        self.classification
    }

    pub fn details(&self) -> &BTreeMap<String, Detail> {
        &self.details
    }

    pub fn detail(&self, key: &str) -> Option<&Detail> {
        self.details.get(key)
    }

    pub fn has_detail(&self, key: &str) -> bool {
        self.details.contains_key(key)
    }

    /// The failure reason, for [`Classification::Failed`] outcomes.
    pub fn error(&self) -> Option<&str> {
        self.detail(detail::ERROR).and_then(Detail::as_text)
    }
}

/// Accumulates details for an outcome that has not been classified yet.
#[derive(Debug)]
#[must_use = "an outcome must be finalized with a classification"]
pub struct OutcomeBuilder {
    path: PathBuf,
    details: BTreeMap<String, Detail>,
}

impl OutcomeBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), details: BTreeMap::new() }
    }

    pub fn detail(mut self, key: &str, value: Detail) -> Self {
        self.details.insert(key.to_string(), value);
        self
    }

    pub fn succeeded(self) -> ActionOutcome {
        self.finish(Classification::Succeeded)
    }

    pub fn failed(self, reason: impl Into<String>) -> ActionOutcome {
        self.detail(detail::ERROR, Detail::Text(reason.into())).finish(Classification::Failed)
    }

    /// Skipped for the reason named by `key`.
    pub fn skipped(self, key: &str) -> ActionOutcome {
        self.detail(key, Detail::Flag).finish(Classification::Skipped)
    }

    pub fn not_a_package(self) -> ActionOutcome {
        self.finish(Classification::NotAPackage)
    }

    fn finish(self, classification: Classification) -> ActionOutcome {
        ActionOutcome { path: self.path, classification, details: self.details }
    }
}
