//! Minimal [BagIt](https://www.rfc-editor.org/rfc/rfc8493) packaging.
//!
//! A bag is a directory holding a `bagit.txt` declaration, a `data/` payload
//! directory and one or more checksum manifests describing the payload. This
//! crate provides just enough of the format for batch tooling:
//!
//! - **Creation in place** via [`make_bag`]: the directory's existing contents
//!   become the payload.
//! - **Validation** via [`Bag::validate`]: fast (Payload-Oxum only),
//!   completeness-only (manifests vs. filesystem), or full checksums.
//! - **Comparison** via [`Bag::compare_manifests_with_fs`], used to find stray
//!   files in an otherwise valid bag.
//!
//! Checksums are calculated with SHA-2 family algorithms and can be spread
//! across a dedicated worker pool. Callers that only need the capability
//! (rather than the types) should go through the [`Packager`] trait.

mod algorithm;
mod bag;
mod checksum;
pub mod error;
mod make;
mod manifest;
#[cfg(feature = "mock")]
pub mod mock;
mod packager;
mod tagfile;

pub use crate::algorithm::{Algorithm, DEFAULT_ALGORITHMS, hash_file, hash_reader};
pub use crate::bag::{Bag, PayloadOxum, ValidateOptions};
pub use crate::make::{CreateOptions, make_bag};
pub use crate::packager::{Bagit, Packager, PackagerHandle};
pub use crate::tagfile::Tags;

/// The bag declaration file.
pub const BAGIT_TXT: &str = "bagit.txt";
/// Optional metadata tag file.
pub const BAG_INFO_TXT: &str = "bag-info.txt";
/// The payload directory.
pub const DATA_DIR: &str = "data";
/// Version written into new bag declarations.
pub const BAGIT_VERSION: &str = "0.97";

/// Standard `bag-info.txt` labels that may be supplied when creating a bag.
pub const STANDARD_BAG_INFO_HEADERS: &[&str] = &[
    "Source-Organization",
    "Organization-Address",
    "Contact-Name",
    "Contact-Phone",
    "Contact-Email",
    "External-Description",
    "External-Identifier",
    "Bag-Size",
    "Bag-Group-Identifier",
    "Bag-Count",
    "Internal-Sender-Identifier",
    "Internal-Sender-Description",
    "BagIt-Profile-Identifier",
];
