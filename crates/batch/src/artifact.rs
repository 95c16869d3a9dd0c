//! Operating-system cruft: desktop metadata, thumbnail caches and resource
//! fork shadow files.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Exact base names that are always junk. `Icon\r` is the macOS custom
/// folder icon marker.
const DENYLIST: &[&str] = &[".DS_Store", "Thumbs.db", "Icon\r"];

// AppleDouble companions written next to files on non-HFS volumes.
static APPLE_DOUBLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\._.+$").unwrap());

/// Whether the file at `path` is a known system artifact.
///
/// Only the base name is matched. Directories are never artifacts.
pub fn is_system_artifact(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    if path.is_dir() {
        return false;
    }
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    DENYLIST.contains(&name) || APPLE_DOUBLE.is_match(name)
}

/// Deletes every system artifact below `root`, returning the removed paths.
///
/// Each directory's listing is collected in full before anything in it is
/// deleted. Symbolic links to directories are not followed.
#[tracing::instrument(skip_all, fields(root = %root.as_ref().display()))]
pub fn strip_system_artifacts(root: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    let mut pending = vec![root.as_ref().to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries = fs::read_dir(&dir)
            .and_then(|listing| listing.map(|entry| entry.map(|e| e.path())).collect::<std::io::Result<Vec<_>>>())
            .or_raise(|| ErrorKind::Filesystem(dir.clone()))?;
        for entry in entries {
            let file_type = fs::symlink_metadata(&entry).or_raise(|| ErrorKind::Filesystem(entry.clone()))?.file_type();
            if file_type.is_dir() {
                pending.push(entry);
            } else if is_system_artifact(&entry) {
                tracing::info!("Removing {}", entry.display());
                fs::remove_file(&entry).or_raise(|| ErrorKind::Filesystem(entry.clone()))?;
                removed.push(entry);
            }
        }
    }
    Ok(removed)
}
