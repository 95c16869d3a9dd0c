//! Scripted packager for testing.

use crate::bag::ValidateOptions;
use crate::error::{ErrorKind, Result};
use crate::make::CreateOptions;
use crate::packager::Packager;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A call received by [`MockPackager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create(PathBuf, CreateOptions),
    Validate(PathBuf, ValidateOptions),
    Unmanifested(PathBuf),
}

/// In-memory [`Packager`] that never touches the filesystem.
///
/// Behaviour is scripted per directory *name* (the last path component), so
/// tests can point it at temporary directories without knowing their full
/// paths. Every call is recorded.
///
/// # Examples
///
/// ```
/// use grabbags_bagit::error::ErrorKind;
/// use grabbags_bagit::mock::{Call, MockPackager};
/// use grabbags_bagit::{Packager, ValidateOptions};
/// use std::path::Path;
///
/// let packager = MockPackager::new().failing("broken", ErrorKind::Validation("checksum mismatch".into()));
/// assert!(packager.validate(Path::new("/bags/broken"), &ValidateOptions::default()).is_err());
/// assert!(packager.validate(Path::new("/bags/fine"), &ValidateOptions::default()).is_ok());
/// assert_eq!(packager.calls().len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct MockPackager {
    failures: HashMap<String, ErrorKind>,
    unmanifested: HashMap<String, Vec<PathBuf>>,
    calls: Mutex<Vec<Call>>,
}

impl MockPackager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation on a directory called `name` fails with `kind`.
    pub fn failing(mut self, name: impl Into<String>, kind: ErrorKind) -> Self {
        self.failures.insert(name.into(), kind);
        self
    }

    /// [`Packager::unmanifested_files`] on a directory called `name` reports `files`.
    pub fn with_unmanifested(
        mut self,
        name: impl Into<String>,
        files: impl IntoIterator<Item = impl Into<PathBuf>>,
    ) -> Self {
        self.unmanifested.insert(name.into(), files.into_iter().map(Into::into).collect());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn record(&self, call: Call, dir: &Path) -> Result<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        match self.failures.get(&Self::name(dir)) {
            Some(kind) => exn::bail!(kind.clone()),
            None => Ok(()),
        }
    }

    fn name(dir: &Path) -> String {
        dir.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
    }
}

impl Packager for MockPackager {
    fn create(&self, dir: &Path, options: &CreateOptions) -> Result<()> {
        self.record(Call::Create(dir.to_path_buf(), options.clone()), dir)
    }

    fn validate(&self, dir: &Path, options: &ValidateOptions) -> Result<()> {
        self.record(Call::Validate(dir.to_path_buf(), *options), dir)
    }

    fn unmanifested_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        self.record(Call::Unmanifested(dir.to_path_buf()), dir)?;
        Ok(self.unmanifested.get(&Self::name(dir)).cloned().unwrap_or_default())
    }
}
