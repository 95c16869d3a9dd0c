//! Package Format Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Every kind except [`ErrorKind::Io`] describes something
//! wrong with the bag itself; callers that process many bags treat those as
//! per-bag failures and keep going.

use derive_more::{Display, Error};

/// A package format error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for package format operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The directory does not have the structure of a bag, or its tag files
    /// cannot be read.
    #[display("invalid bag: {_0}")]
    InvalidBag(#[error(not(source))] String),
    /// The payload disagrees with the manifests or the Payload-Oxum.
    #[display("bag validation failed: {_0}")]
    Validation(#[error(not(source))] String),
    /// The directory could not be converted into a bag.
    #[display("bag could not be created: {_0}")]
    Creation(#[error(not(source))] String),
    /// The requested checksum algorithm is not supported.
    #[display("unsupported checksum algorithm: {_0}")]
    UnsupportedAlgorithm(#[error(not(source))] String),
    /// Reading the filesystem failed outside of anything the bag format
    /// accounts for.
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Returns `true` if the error describes the bag (malformed, invalid,
    /// uncreatable) rather than the environment.
    pub fn is_domain(&self) -> bool {
        !matches!(self, Self::Io)
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io)
    }
}
