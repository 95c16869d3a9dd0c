//! The capability the batch engine consumes: create, validate, and diff a
//! package against its manifest.

use crate::bag::{Bag, ValidateOptions};
use crate::error::Result;
use crate::make::{CreateOptions, make_bag};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Package-format operations on a single directory.
///
/// Implementations report problems with the package itself through the
/// domain [`ErrorKind`](crate::error::ErrorKind) variants and reserve
/// [`ErrorKind::Io`](crate::error::ErrorKind::Io) for everything else.
pub trait Packager {
    /// Converts `dir` into a package in place.
    fn create(&self, dir: &Path, options: &CreateOptions) -> Result<()>;

    /// Checks an existing package's integrity.
    fn validate(&self, dir: &Path, options: &ValidateOptions) -> Result<()>;

    /// Payload files present on disk but absent from the manifest, relative
    /// to `dir`.
    fn unmanifested_files(&self, dir: &Path) -> Result<Vec<PathBuf>>;
}

pub type PackagerHandle = Arc<dyn Packager + Send + Sync>;

/// [`Packager`] backed by real BagIt bags on the local filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct Bagit;

impl Bagit {
    pub fn handle() -> PackagerHandle {
        Arc::new(Self)
    }
}

impl Packager for Bagit {
    fn create(&self, dir: &Path, options: &CreateOptions) -> Result<()> {
        make_bag(dir, options).map(|_| ())
    }

    fn validate(&self, dir: &Path, options: &ValidateOptions) -> Result<()> {
        Bag::open(dir)?.validate(options)
    }

    fn unmanifested_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let (_, only_on_fs) = Bag::open(dir)?.compare_manifests_with_fs()?;
        Ok(only_on_fs)
    }
}
