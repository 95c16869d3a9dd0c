use crate::action::{Action, ActionKind, fail, isolate};
use crate::artifact::strip_system_artifacts;
use crate::detect::is_package;
use crate::error::{ErrorKind, Result};
use crate::options::RunConfiguration;
use crate::outcome::{ActionOutcome, Detail, OutcomeBuilder, detail};
use exn::ResultExt;
use grabbags_bagit::PackagerHandle;
use std::fs;
use std::path::Path;
use tracing::instrument;

/// Turns a plain directory into a package in place.
///
/// Empty directories and existing packages are skipped untouched. When
/// [`RunConfiguration::strip_system_files`] is set, system artifacts are
/// deleted first so they never reach the manifest.
pub struct CreateAction {
    packager: PackagerHandle,
}

impl CreateAction {
    pub fn new(packager: PackagerHandle) -> Self {
        Self { packager }
    }
}

impl Action for CreateAction {
    fn kind(&self) -> ActionKind {
        ActionKind::Create
    }

    #[instrument(skip_all, fields(dir = %path.display()))]
    fn execute(&self, path: &Path, config: &RunConfiguration) -> Result<ActionOutcome> {
        let mut outcome = OutcomeBuilder::new(path);
        if fs::read_dir(path).or_raise(|| ErrorKind::Filesystem(path.to_path_buf()))?.next().is_none() {
            tracing::warn!("{} is an empty directory. Skipped.", path.display());
            return Ok(outcome.skipped(detail::EMPTY_DIRECTORY));
        }
        if is_package(path) {
            tracing::warn!("{} is already a bag. Skipped.", path.display());
            return Ok(outcome.skipped(detail::ALREADY_A_PACKAGE));
        }

        if config.strip_system_files {
            tracing::info!("Cleaning {} of system files", path.display());
            let removed = strip_system_artifacts(path)?;
            outcome = outcome.detail(detail::REMOVED, Detail::Paths(removed));
        }
        match isolate(self.packager.create(path, &config.create_options()))? {
            Ok(()) => {
                tracing::info!("Bagged {}", path.display());
                Ok(outcome.succeeded())
            },
            Err(reason) => Ok(fail(self.kind(), outcome, path, reason)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::Classification;
    use grabbags_bagit::error::ErrorKind as PackageErrorKind;
    use grabbags_bagit::mock::{Call, MockPackager};
    use grabbags_bagit::{Algorithm, Bagit, CreateOptions};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn listing(path: &Path) -> Vec<String> {
        let mut names: Vec<String> =
            fs::read_dir(path).unwrap().map(|e| e.unwrap().file_name().to_string_lossy().into_owned()).collect();
        names.sort();
        names
    }

    #[test]
    fn test_empty_directory_is_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let outcome =
            CreateAction::new(Bagit::handle()).execute(temp_dir.path(), &RunConfiguration::default()).unwrap();
        assert_eq!(outcome.classification(), Classification::Skipped);
        assert!(outcome.has_detail(detail::EMPTY_DIRECTORY));
        assert!(!temp_dir.path().join("data").exists());
        assert!(listing(temp_dir.path()).is_empty());
    }

    #[test]
    fn test_create_twice_is_idempotent() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("text.txt"), b"hello").unwrap();
        let action = CreateAction::new(Bagit::handle());
        let config = RunConfiguration::default();

        let first = action.execute(temp_dir.path(), &config).unwrap();
        assert_eq!(first.classification(), Classification::Succeeded);
        let after_first = listing(temp_dir.path());
        let manifest = fs::read(temp_dir.path().join("manifest-sha256.txt")).unwrap();

        let second = action.execute(temp_dir.path(), &config).unwrap();
        assert_eq!(second.classification(), Classification::Skipped);
        assert!(second.has_detail(detail::ALREADY_A_PACKAGE));
        assert_eq!(listing(temp_dir.path()), after_first);
        assert_eq!(fs::read(temp_dir.path().join("manifest-sha256.txt")).unwrap(), manifest);
        assert_eq!(listing(&temp_dir.path().join("data")), vec!["text.txt"]);
    }

    #[test]
    fn test_strip_system_files_before_bagging() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("text.txt"), b"hello").unwrap();
        fs::write(temp_dir.path().join(".DS_Store"), b"junk").unwrap();
        fs::write(temp_dir.path().join("._text.txt"), b"junk").unwrap();
        let config = RunConfiguration { strip_system_files: true, ..RunConfiguration::default() };

        let outcome = CreateAction::new(Bagit::handle()).execute(temp_dir.path(), &config).unwrap();
        assert_eq!(outcome.classification(), Classification::Succeeded);
        assert_eq!(outcome.detail(detail::REMOVED).map(Detail::count), Some(2));
        assert_eq!(listing(&temp_dir.path().join("data")), vec!["text.txt"]);
        let manifest = fs::read_to_string(temp_dir.path().join("manifest-sha256.txt")).unwrap();
        assert!(!manifest.contains(".DS_Store"));
    }

    #[test]
    fn test_system_files_kept_without_flag() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("text.txt"), b"hello").unwrap();
        fs::write(temp_dir.path().join(".DS_Store"), b"junk").unwrap();

        let outcome =
            CreateAction::new(Bagit::handle()).execute(temp_dir.path(), &RunConfiguration::default()).unwrap();
        assert!(!outcome.has_detail(detail::REMOVED));
        assert!(temp_dir.path().join("data/.DS_Store").is_file());
    }

    #[test]
    fn test_creation_failure_is_captured() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().join("stubborn");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("text.txt"), b"hello").unwrap();
        let packager = Arc::new(
            MockPackager::new().failing("stubborn", PackageErrorKind::Creation("permission denied".into())),
        );

        let outcome = CreateAction::new(packager.clone()).execute(&dir, &RunConfiguration::default()).unwrap();
        assert_eq!(outcome.classification(), Classification::Failed);
        assert_eq!(outcome.error(), Some("bag could not be created: permission denied"));
        assert!(matches!(packager.calls().as_slice(), [Call::Create(called, _)] if *called == dir));
    }

    #[test]
    fn test_create_options_forwarded() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("text.txt"), b"hello").unwrap();
        let packager = Arc::new(MockPackager::new());
        let config = RunConfiguration {
            processes: 3,
            checksums: vec![Algorithm::Sha384, Algorithm::Sha224],
            bag_info: BTreeMap::from([("Contact-Name".to_string(), "Archivist".to_string())]),
            ..RunConfiguration::default()
        };

        let outcome = CreateAction::new(packager.clone()).execute(temp_dir.path(), &config).unwrap();
        assert_eq!(outcome.classification(), Classification::Succeeded);
        let expected = CreateOptions {
            bag_info: BTreeMap::from([("Contact-Name".to_string(), "Archivist".to_string())]),
            processes: 3,
            algorithms: vec![Algorithm::Sha384, Algorithm::Sha224],
        };
        assert_eq!(packager.calls(), vec![Call::Create(temp_dir.path().to_path_buf(), expected)]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_payload_name_fails() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = tempfile::tempdir().unwrap();
        let name = OsStr::from_bytes(b"caf\xE9.txt");
        fs::write(temp_dir.path().join(name), b"latin-1").unwrap();

        let outcome =
            CreateAction::new(Bagit::handle()).execute(temp_dir.path(), &RunConfiguration::default()).unwrap();
        assert_eq!(outcome.classification(), Classification::Failed);
        assert!(outcome.error().is_some_and(|e| e.contains("not a valid UTF-8 file name")));
        assert!(temp_dir.path().join(name).is_file());
        assert!(!is_package(temp_dir.path()));
    }

    #[test]
    fn test_io_failure_propagates() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().join("broken");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("text.txt"), b"hello").unwrap();
        let packager = Arc::new(MockPackager::new().failing("broken", PackageErrorKind::Io));

        let err = CreateAction::new(packager).execute(&dir, &RunConfiguration::default()).unwrap_err();
        assert!(!err.is_domain());
    }
}
