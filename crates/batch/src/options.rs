//! Turning user input into a run plan.
//!
//! Both the command line and the desktop front-end build an [`Options`] and
//! call [`Options::resolve`], so the same combinations are rejected whichever
//! surface the request came from. Resolution never touches the filesystem.

use crate::action::ActionKind;
use crate::error::{ErrorKind, Result};
use grabbags_bagit::{Algorithm, CreateOptions, ValidateOptions};
use std::collections::BTreeMap;

/// Raw, unchecked user input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    pub kind: ActionKind,
    /// Signed so that negative input can be reported instead of wrapped.
    pub processes: i64,
    pub fast: bool,
    pub completeness_only: bool,
    pub strip_system_files: bool,
    /// Explicitly selected checksum algorithms; empty when none were given.
    pub checksums: Vec<Algorithm>,
    pub bag_info: BTreeMap<String, String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            kind: ActionKind::default(),
            processes: 1,
            fast: false,
            completeness_only: false,
            strip_system_files: false,
            checksums: Vec::new(),
            bag_info: BTreeMap::new(),
        }
    }
}

/// A validated request: what to do, and how.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plan {
    pub kind: ActionKind,
    pub config: RunConfiguration,
}

/// Settings shared by every action in a run. Never changed once a run starts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunConfiguration {
    /// Worker threads for checksum calculation; 0 and 1 both mean one.
    pub processes: usize,
    /// Validate: check Payload-Oxum only.
    pub fast: bool,
    /// Validate: check manifest completeness but skip checksums.
    pub completeness_only: bool,
    /// Create: delete system artifacts before bagging.
    pub strip_system_files: bool,
    /// Create: manifest algorithms. Empty means the package defaults.
    pub checksums: Vec<Algorithm>,
    /// Create: extra `bag-info.txt` tags.
    pub bag_info: BTreeMap<String, String>,
}

impl RunConfiguration {
    /// Uses `defaults` when no algorithm was chosen explicitly.
    pub fn with_default_checksums(mut self, defaults: &[Algorithm]) -> Self {
        if self.checksums.is_empty() {
            self.checksums = defaults.to_vec();
        }
        self
    }

    pub(crate) fn create_options(&self) -> CreateOptions {
        CreateOptions {
            bag_info: self.bag_info.clone(),
            processes: self.processes,
            algorithms: self.checksums.clone(),
        }
    }

    pub(crate) fn validate_options(&self) -> ValidateOptions {
        ValidateOptions { processes: self.processes, fast: self.fast, completeness_only: self.completeness_only }
    }
}

impl Options {
    /// Checks every option combination and produces the plan for a run.
    ///
    /// # Errors
    /// [`ErrorKind::Configuration`] naming the first conflicting option.
    pub fn resolve(self) -> Result<Plan> {
        let invalid = |message: &str| exn::Exn::from(ErrorKind::Configuration(message.to_string()));
        let processes = usize::try_from(self.processes)
            .map_err(|_| invalid("The number of processes must be 0 or greater"))?;
        let validating = self.kind == ActionKind::Validate;
        if self.completeness_only && !validating {
            return Err(invalid("--no-checksums is only allowed as an option with --validate"));
        }
        if self.kind == ActionKind::Clean && self.strip_system_files {
            return Err(invalid("Can't run --clean and --no-system-files at the same time"));
        }
        if !self.checksums.is_empty() && self.kind != ActionKind::Create {
            return Err(invalid(&format!(
                "Can't specify a checksum algorithm and run --{} at the same time",
                self.kind
            )));
        }
        if self.fast && !validating {
            return Err(invalid("--fast is only allowed as an option with --validate"));
        }

        let config = RunConfiguration {
            processes,
            fast: self.fast,
            completeness_only: self.completeness_only,
            strip_system_files: self.strip_system_files,
            checksums: self.checksums,
            bag_info: self.bag_info,
        };
        Ok(Plan { kind: self.kind, config })
    }
}
