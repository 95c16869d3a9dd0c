//! Batch Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Only [`ErrorKind::Package`] wrapping a domain package
//! error is isolated per directory; everything else aborts the run.

use derive_more::{Display, Error};
use grabbags_bagit::error::ErrorKind as PackageErrorKind;
use std::path::PathBuf;

/// A batch error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for batch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a batch failure.
///
/// ### Per-directory Errors
/// - [`ErrorKind::Package`] when the wrapped kind is a domain error.
///
/// ### Fatal Errors
/// - [`ErrorKind::Package`] wrapping [`PackageErrorKind::Io`]
/// - [`ErrorKind::Filesystem`]
/// - [`ErrorKind::Configuration`], raised before any directory is touched.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The package-format collaborator failed.
    #[display("{_0}")]
    Package(#[error(not(source))] PackageErrorKind),
    /// Listing, inspecting or deleting an entry failed.
    #[display("filesystem operation failed on {}", _0.display())]
    Filesystem(#[error(not(source))] PathBuf),
    /// The requested options are invalid or contradict each other.
    #[display("{_0}")]
    Configuration(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` for expected failure modes of a single package, which
    /// are recorded against that directory instead of aborting the run.
    pub fn is_domain(&self) -> bool {
        matches!(self, Self::Package(kind) if kind.is_domain())
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Package(kind) => kind.is_retryable(),
            Self::Filesystem(_) => true,
            Self::Configuration(_) => false,
        }
    }
}
