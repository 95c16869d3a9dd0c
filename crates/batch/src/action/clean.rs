use crate::action::{Action, ActionKind, fail, isolate};
use crate::artifact::is_system_artifact;
use crate::detect::is_package;
use crate::error::{ErrorKind, Result};
use crate::options::RunConfiguration;
use crate::outcome::{ActionOutcome, Detail, OutcomeBuilder, detail};
use exn::ResultExt;
use grabbags_bagit::PackagerHandle;
use std::fs;
use std::path::Path;
use tracing::instrument;

/// Deletes system artifacts that crept into a package's payload after it
/// was bagged.
///
/// Only files that are both missing from the manifest and recognized as
/// system artifacts are deleted. Any other unmanifested file is reported
/// and left in place, and does not fail the directory.
pub struct CleanAction {
    packager: PackagerHandle,
}

impl CleanAction {
    pub fn new(packager: PackagerHandle) -> Self {
        Self { packager }
    }
}

impl Action for CleanAction {
    fn kind(&self) -> ActionKind {
        ActionKind::Clean
    }

    #[instrument(skip_all, fields(dir = %path.display()))]
    fn execute(&self, path: &Path, _config: &RunConfiguration) -> Result<ActionOutcome> {
        let outcome = OutcomeBuilder::new(path);
        if !is_package(path) {
            tracing::warn!("{} is not a bag. Not cleaning.", path.display());
            return Ok(outcome.not_a_package());
        }

        let extra = match isolate(self.packager.unmanifested_files(path))? {
            Ok(extra) => extra,
            Err(reason) => return Ok(fail(self.kind(), outcome, path, reason)),
        };
        if extra.is_empty() {
            tracing::info!("No system files located in {}", path.display());
            return Ok(outcome.detail(detail::ALREADY_CLEAN, Detail::Flag).succeeded());
        }

        let mut removed = Vec::new();
        let mut unmanifested = Vec::new();
        for relative in extra {
            let file = path.join(&relative);
            if is_system_artifact(&file) {
                tracing::info!(file = %relative.display(), "Removing system files from {}", path.display());
                fs::remove_file(&file).or_raise(|| ErrorKind::Filesystem(file.clone()))?;
                removed.push(relative);
            } else {
                tracing::warn!("Found file not in manifest: {}", relative.display());
                unmanifested.push(relative);
            }
        }
        Ok(outcome
            .detail(detail::REMOVED, Detail::Paths(removed))
            .detail(detail::UNMANIFESTED, Detail::Paths(unmanifested))
            .succeeded())
    }
}
