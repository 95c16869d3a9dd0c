use crate::action::{Action, ActionKind, fail, isolate};
use crate::detect::is_package;
use crate::error::Result;
use crate::options::RunConfiguration;
use crate::outcome::{ActionOutcome, Detail, OutcomeBuilder, detail};
use derive_more::Display;
use grabbags_bagit::PackagerHandle;
use std::path::Path;
use tracing::instrument;

/// How much of a package a validation run checks.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum ValidationMode {
    /// Payload-Oxum only.
    #[display("fast")]
    Fast,
    /// Payload-Oxum and manifest completeness, no checksums.
    #[display("completeness_only")]
    CompletenessOnly,
    #[display("full")]
    Full,
}

impl ValidationMode {
    /// Fast wins over completeness-only, which wins over full.
    pub fn of(config: &RunConfiguration) -> Self {
        if config.fast {
            Self::Fast
        } else if config.completeness_only {
            Self::CompletenessOnly
        } else {
            Self::Full
        }
    }
}

/// Checks the integrity of an existing package. Directories that are not
/// packages are reported separately and left alone.
pub struct ValidateAction {
    packager: PackagerHandle,
}

impl ValidateAction {
    pub fn new(packager: PackagerHandle) -> Self {
        Self { packager }
    }
}

impl Action for ValidateAction {
    fn kind(&self) -> ActionKind {
        ActionKind::Validate
    }

    #[instrument(skip_all, fields(dir = %path.display()))]
    fn execute(&self, path: &Path, config: &RunConfiguration) -> Result<ActionOutcome> {
        let outcome = OutcomeBuilder::new(path);
        if !is_package(path) {
            tracing::warn!("{} is not a bag. Skipped.", path.display());
            return Ok(outcome.not_a_package());
        }

        let mode = ValidationMode::of(config);
        let outcome = outcome.detail(detail::VALIDATION_MODE, Detail::Text(mode.to_string()));
        match isolate(self.packager.validate(path, &config.validate_options()))? {
            Ok(()) => {
                match mode {
                    ValidationMode::Fast => tracing::info!("{} valid according to Payload-Oxum", path.display()),
                    ValidationMode::CompletenessOnly => {
                        tracing::info!("{} valid according to Payload-Oxum and file manifest", path.display())
                    },
                    ValidationMode::Full => tracing::info!("{} is valid", path.display()),
                }
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
    use grabbags_bagit::{Bagit, CreateOptions, Packager, ValidateOptions};
    use rstest::rstest;
    use std::fs;
    use std::sync::Arc;

    #[rstest]
    #[case(true, true, ValidationMode::Fast)]
    #[case(true, false, ValidationMode::Fast)]
    #[case(false, true, ValidationMode::CompletenessOnly)]
    #[case(false, false, ValidationMode::Full)]
    fn test_mode_priority(#[case] fast: bool, #[case] completeness_only: bool, #[case] expected: ValidationMode) {
        let config = RunConfiguration { fast, completeness_only, ..RunConfiguration::default() };
        assert_eq!(ValidationMode::of(&config), expected);
    }

    #[test]
    fn test_not_a_package() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("text.txt"), b"hello").unwrap();
        let packager = Arc::new(MockPackager::new());
        let outcome =
            ValidateAction::new(packager.clone()).execute(temp_dir.path(), &RunConfiguration::default()).unwrap();
        assert_eq!(outcome.classification(), Classification::NotAPackage);
        assert!(packager.calls().is_empty());
    }

    #[rstest]
    #[case(RunConfiguration::default(), "full")]
    #[case(RunConfiguration { fast: true, ..RunConfiguration::default() }, "fast")]
    #[case(
        RunConfiguration { completeness_only: true, processes: 4, ..RunConfiguration::default() },
        "completeness_only"
    )]
    fn test_valid_package(#[case] config: RunConfiguration, #[case] mode: &str) {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("text.txt"), b"hello").unwrap();
        Bagit.create(temp_dir.path(), &CreateOptions::default()).unwrap();

        let outcome = ValidateAction::new(Bagit::handle()).execute(temp_dir.path(), &config).unwrap();
        assert_eq!(outcome.classification(), Classification::Succeeded);
        assert_eq!(outcome.detail(detail::VALIDATION_MODE).and_then(Detail::as_text), Some(mode));
    }

    #[test]
    fn test_tampered_package_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("text.txt"), b"hello").unwrap();
        Bagit.create(temp_dir.path(), &CreateOptions::default()).unwrap();
        fs::write(temp_dir.path().join("data/text.txt"), b"jello").unwrap();

        let outcome =
            ValidateAction::new(Bagit::handle()).execute(temp_dir.path(), &RunConfiguration::default()).unwrap();
        assert_eq!(outcome.classification(), Classification::Failed);
        assert!(outcome.error().is_some_and(|e| e.contains("data/text.txt")));
    }

    #[test]
    fn test_validate_options_forwarded() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().join("bag");
        fs::create_dir_all(dir.join("data")).unwrap();
        fs::write(dir.join("bagit.txt"), b"").unwrap();
        let packager =
            Arc::new(MockPackager::new().failing("bag", PackageErrorKind::InvalidBag("no manifest".into())));

        let outcome = ValidateAction::new(packager.clone()).execute(&dir, &RunConfiguration::default()).unwrap();
        assert_eq!(outcome.classification(), Classification::Failed);
        assert_eq!(outcome.error(), Some("invalid bag: no manifest"));
        assert!(matches!(packager.calls().as_slice(), [Call::Validate(called, _)] if *called == dir));
    }

    #[rstest]
    #[case(RunConfiguration::default(), ValidateOptions::default())]
    #[case(
        RunConfiguration { fast: true, processes: 2, ..RunConfiguration::default() },
        ValidateOptions { processes: 2, fast: true, completeness_only: false }
    )]
    #[case(
        RunConfiguration { completeness_only: true, processes: 4, ..RunConfiguration::default() },
        ValidateOptions { processes: 4, fast: false, completeness_only: true }
    )]
    fn test_validate_options_reach_packager(#[case] config: RunConfiguration, #[case] expected: ValidateOptions) {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().join("bag");
        fs::create_dir_all(dir.join("data")).unwrap();
        fs::write(dir.join("bagit.txt"), b"").unwrap();
        let packager = Arc::new(MockPackager::new());

        let outcome = ValidateAction::new(packager.clone()).execute(&dir, &config).unwrap();
        assert_eq!(outcome.classification(), Classification::Succeeded);
        assert_eq!(packager.calls(), vec![Call::Validate(dir, expected)]);
    }
}
