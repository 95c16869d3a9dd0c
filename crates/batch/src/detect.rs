use grabbags_bagit::{BAGIT_TXT, DATA_DIR};
use std::path::Path;

/// Whether `path` directly contains both `bagit.txt` and `data`.
///
/// Only existence is checked; neither entry is opened. Paths that do not
/// exist or cannot be inspected are simply not packages.
pub fn is_package(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    [BAGIT_TXT, DATA_DIR].iter().all(|entry| path.join(entry).try_exists().unwrap_or(false))
}
