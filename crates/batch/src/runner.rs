use crate::action::{Action, ActionKind, fail};
use crate::error::{ErrorKind, Result};
use crate::options::RunConfiguration;
use crate::outcome::{ActionOutcome, Classification, OutcomeBuilder};
use crate::report::Report;
use exn::ResultExt;
use grabbags_bagit::PackagerHandle;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Everything a single run produced.
///
/// Every processed directory appears in exactly one of the four buckets,
/// and in [`outcomes`](Self::outcomes), in the order it was processed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    kind: ActionKind,
    successes: Vec<PathBuf>,
    failures: Vec<PathBuf>,
    not_a_package: Vec<PathBuf>,
    skipped: Vec<PathBuf>,
    outcomes: Vec<ActionOutcome>,
}

impl BatchResult {
    pub(crate) fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            successes: Vec::new(),
            failures: Vec::new(),
            not_a_package: Vec::new(),
            skipped: Vec::new(),
            outcomes: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, outcome: ActionOutcome) {
        let bucket = match outcome.classification() {
            Classification::Succeeded => &mut self.successes,
            Classification::Failed => &mut self.failures,
            Classification::NotAPackage => &mut self.not_a_package,
            Classification::Skipped => &mut self.skipped,
        };
        bucket.push(outcome.path().to_path_buf());
        self.outcomes.push(outcome);
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn successes(&self) -> &[PathBuf] {
        &self.successes
    }

    pub fn failures(&self) -> &[PathBuf] {
        &self.failures
    }

    pub fn not_a_package(&self) -> &[PathBuf] {
        &self.not_a_package
    }

    pub fn skipped(&self) -> &[PathBuf] {
        &self.skipped
    }

    pub fn outcomes(&self) -> &[ActionOutcome] {
        &self.outcomes
    }

    /// Whether any directory failed.
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Sum of [`Detail::count`](crate::Detail::count) for `key` across all
    /// outcomes.
    pub fn total(&self, key: &str) -> usize {
        self.outcomes.iter().filter_map(|o| o.detail(key)).map(|d| d.count()).sum()
    }

    pub fn report(&self) -> Report<'_> {
        Report::new(self)
    }
}

/// Applies one action to every immediate subdirectory of a list of parent
/// directories.
///
/// Directories are processed one at a time. A package problem in one
/// directory is recorded as a failure and the run moves on; any other error
/// stops the run.
pub struct BatchRunner {
    packager: PackagerHandle,
}

impl BatchRunner {
    pub fn new(packager: PackagerHandle) -> Self {
        Self { packager }
    }

    /// Immediate subdirectories of `parent`, in listing order. Symbolic links
    /// to directories count; everything else is ignored.
    pub fn discover(parent: &Path) -> Result<Vec<PathBuf>> {
        let listing = fs::read_dir(parent).or_raise(|| ErrorKind::Filesystem(parent.to_path_buf()))?;
        let mut candidates = Vec::new();
        for entry in listing {
            let path = entry.or_raise(|| ErrorKind::Filesystem(parent.to_path_buf()))?.path();
            if path.is_dir() {
                candidates.push(path);
            }
        }
        Ok(candidates)
    }

    pub fn run(
        &self,
        parents: &[impl AsRef<Path>],
        kind: ActionKind,
        config: &RunConfiguration,
    ) -> Result<BatchResult> {
        let action = kind.action(self.packager.clone());
        Self::run_with(parents, action.as_ref(), config)
    }

    /// Runs an already constructed `action`.
    #[instrument(skip_all, fields(action = %action.kind()))]
    pub fn run_with(
        parents: &[impl AsRef<Path>],
        action: &(dyn Action + Send + Sync),
        config: &RunConfiguration,
    ) -> Result<BatchResult> {
        let mut result = BatchResult::new(action.kind());
        for parent in parents {
            let parent = parent.as_ref();
            tracing::info!("Looking in {}", parent.display());
            for dir in Self::discover(parent)? {
                let outcome = match action.execute(&dir, config) {
                    Ok(outcome) => outcome,
                    Err(e) if e.is_domain() => fail(action.kind(), OutcomeBuilder::new(&dir), &dir, (*e).to_string()),
                    Err(e) => return Err(e),
                };
                let classification = outcome.classification();
                tracing::debug!(dir = %dir.display(), %classification, "Directory processed");
                result.record(outcome);
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::detail;
    use grabbags_bagit::error::ErrorKind as PackageErrorKind;
    use grabbags_bagit::mock::MockPackager;
    use grabbags_bagit::{Bagit, CreateOptions, Packager};
    use std::sync::Arc;

    /// An action that lets package errors escape instead of capturing them.
    struct Leaky(PackageErrorKind);

    impl Action for Leaky {
        fn kind(&self) -> ActionKind {
            ActionKind::Validate
        }

        fn execute(&self, path: &Path, _config: &RunConfiguration) -> Result<ActionOutcome> {
            if path.ends_with("leaks") {
                exn::bail!(ErrorKind::Package(self.0.clone()));
            }
            Ok(OutcomeBuilder::new(path).succeeded())
        }
    }

    fn sorted(paths: &[PathBuf]) -> Vec<PathBuf> {
        let mut paths = paths.to_vec();
        paths.sort();
        paths
    }

    #[test]
    fn test_discover_ignores_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::create_dir(temp_dir.path().join("one")).unwrap();
        fs::create_dir(temp_dir.path().join("two")).unwrap();
        fs::write(temp_dir.path().join("loose.txt"), b"").unwrap();
        let found = BatchRunner::discover(temp_dir.path()).unwrap();
        assert_eq!(sorted(&found), vec![temp_dir.path().join("one"), temp_dir.path().join("two")]);
    }

    #[test]
    fn test_end_to_end_create() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().join("root");
        fs::create_dir_all(root.join("bag1")).unwrap();
        fs::write(root.join("bag1/text.txt"), b"original content").unwrap();

        let runner = BatchRunner::new(Bagit::handle());
        let result = runner.run(&[&root], ActionKind::Create, &RunConfiguration::default()).unwrap();
        assert_eq!(result.successes(), [root.join("bag1")]);
        assert!(result.failures().is_empty());
        assert_eq!(fs::read(root.join("bag1/data/text.txt")).unwrap(), b"original content");
        assert!(root.join("bag1/bagit.txt").is_file());
        assert!(root.join("bag1/bag-info.txt").is_file());
        assert!(root.join("bag1/manifest-sha256.txt").is_file());
        assert!(root.join("bag1/tagmanifest-sha256.txt").is_file());
    }

    #[test]
    fn test_validate_isolates_failures() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        for name in ["good", "bad"] {
            fs::create_dir(root.join(name)).unwrap();
            fs::write(root.join(name).join("text.txt"), b"payload").unwrap();
            Bagit.create(&root.join(name), &CreateOptions::default()).unwrap();
        }
        fs::remove_file(root.join("bad/data/text.txt")).unwrap();
        fs::create_dir(root.join("plain")).unwrap();

        let runner = BatchRunner::new(Bagit::handle());
        let result = runner.run(&[root], ActionKind::Validate, &RunConfiguration::default()).unwrap();
        assert_eq!(result.successes(), [root.join("good")]);
        assert_eq!(result.failures(), [root.join("bad")]);
        assert_eq!(result.not_a_package(), [root.join("plain")]);
        assert!(result.skipped().is_empty());
        assert_eq!(result.outcomes().len(), 3);
        assert!(result.has_failures());
    }

    #[test]
    fn test_every_candidate_lands_in_one_bucket() {
        let temp_dir = tempfile::tempdir().unwrap();
        let first = temp_dir.path().join("first");
        let second = temp_dir.path().join("second");
        for dir in ["first/empty", "first/plain", "second/bagged", "second/broken"] {
            fs::create_dir_all(temp_dir.path().join(dir)).unwrap();
        }
        fs::write(first.join("plain/a.txt"), b"a").unwrap();
        for dir in ["bagged", "broken"] {
            fs::create_dir(second.join(dir).join("data")).unwrap();
            fs::write(second.join(dir).join("bagit.txt"), b"").unwrap();
        }
        let packager = Arc::new(MockPackager::new().failing("plain", PackageErrorKind::Creation("disk full".into())));

        let result = BatchRunner::new(packager)
            .run(&[first.clone(), second.clone()], ActionKind::Create, &RunConfiguration::default())
            .unwrap();
        assert_eq!(result.failures(), [first.join("plain")]);
        assert_eq!(sorted(result.skipped()), vec![first.join("empty"), second.join("bagged"), second.join("broken")]);
        assert!(result.successes().is_empty());
        assert_eq!(result.total(detail::ALREADY_A_PACKAGE), 2);
        assert_eq!(result.total(detail::EMPTY_DIRECTORY), 1);
        // Parents are visited in the order given.
        assert!(result.outcomes()[..2].iter().all(|o| o.path().starts_with(&first)));
    }

    #[test]
    fn test_escaped_domain_error_is_recorded() {
        let temp_dir = tempfile::tempdir().unwrap();
        for name in ["leaks", "fine"] {
            fs::create_dir(temp_dir.path().join(name)).unwrap();
        }
        let action = Leaky(PackageErrorKind::Validation("manifest mismatch".into()));
        let result = BatchRunner::run_with(&[temp_dir.path()], &action, &RunConfiguration::default()).unwrap();
        assert_eq!(result.failures(), [temp_dir.path().join("leaks")]);
        assert_eq!(result.successes(), [temp_dir.path().join("fine")]);
        assert_eq!(result.outcomes().iter().find_map(|o| o.error()), Some("bag validation failed: manifest mismatch"));
    }

    #[test]
    fn test_non_domain_error_aborts() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::create_dir(temp_dir.path().join("leaks")).unwrap();
        let action = Leaky(PackageErrorKind::Io);
        let err = BatchRunner::run_with(&[temp_dir.path()], &action, &RunConfiguration::default()).unwrap_err();
        assert_eq!(*err, ErrorKind::Package(PackageErrorKind::Io));
    }

    #[test]
    fn test_missing_parent_is_fatal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("missing");
        let err = BatchRunner::new(Bagit::handle())
            .run(&[&missing], ActionKind::Validate, &RunConfiguration::default())
            .unwrap_err();
        assert_eq!(*err, ErrorKind::Filesystem(missing));
    }

    #[test]
    fn test_runs_do_not_share_state() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::create_dir(temp_dir.path().join("plain")).unwrap();
        let runner = BatchRunner::new(Arc::new(MockPackager::new()));
        let first = runner.run(&[temp_dir.path()], ActionKind::Validate, &RunConfiguration::default()).unwrap();
        let second = runner.run(&[temp_dir.path()], ActionKind::Validate, &RunConfiguration::default()).unwrap();
        assert_eq!(first, second);
        assert_eq!(second.not_a_package().len(), 1);
    }
}
