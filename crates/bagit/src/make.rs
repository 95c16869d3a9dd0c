//! Converting a plain directory into a bag in place.

use crate::algorithm::{Algorithm, DEFAULT_ALGORITHMS};
use crate::bag::{Bag, PayloadOxum};
use crate::checksum::digest_files;
use crate::error::{ErrorKind, Result};
use crate::manifest::{self, Family};
use crate::tagfile;
use crate::{BAG_INFO_TXT, BAGIT_TXT, BAGIT_VERSION, DATA_DIR};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::instrument;
use walkdir::WalkDir;

/// Identifies this tool in `bag-info.txt`.
const SOFTWARE_AGENT: &str =
    concat!("grabbags v", env!("CARGO_PKG_VERSION"), " <https://github.com/amiaopensource/grabbags>");

/// Parameters for [`make_bag`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CreateOptions {
    /// Extra tags for `bag-info.txt`, e.g. `Source-Organization`.
    pub bag_info: BTreeMap<String, String>,
    /// Concurrency hint for checksum calculation.
    pub processes: usize,
    /// Manifest algorithms. Empty means [`DEFAULT_ALGORITHMS`].
    pub algorithms: Vec<Algorithm>,
}

impl CreateOptions {
    fn algorithms(&self) -> Vec<Algorithm> {
        let mut algorithms = match self.algorithms.is_empty() {
            true => DEFAULT_ALGORITHMS.to_vec(),
            false => self.algorithms.clone(),
        };
        algorithms.sort();
        algorithms.dedup();
        algorithms
    }
}

/// Moves the contents of `dir` into a `data` payload directory and writes
/// the declaration, bag-info, payload manifests and tag manifests around it.
///
/// Every failure is reported as [`ErrorKind::Creation`]. If the payload
/// cannot be moved into place, entries already moved are put back.
#[instrument(skip(options), fields(dir = %dir.display(), processes = options.processes))]
pub fn make_bag(dir: &Path, options: &CreateOptions) -> Result<Bag> {
    if !dir.is_dir() {
        exn::bail!(ErrorKind::Creation(format!("{} is not a directory", dir.display())));
    }
    reject_non_utf8_names(dir)?;
    tracing::info!("Creating bag for directory {}", dir.display());
    move_into_payload(dir)?;

    let algorithms = options.algorithms();
    let data_dir = dir.join(DATA_DIR);
    let mut payload = Vec::new();
    for entry in WalkDir::new(&data_dir).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| ErrorKind::Creation(format!("unable to walk payload: {e}")))?;
        if entry.file_type().is_file() {
            let relative = entry.path().strip_prefix(dir).map_err(|e| ErrorKind::Creation(e.to_string()))?;
            payload.push(relative.to_path_buf());
        }
    }
    tracing::info!(files = payload.len(), "Using {} processes to generate manifests", options.processes.max(1));
    let hashed = write_manifests(dir, Family::Payload, &payload, &algorithms, options.processes)?;
    let octets = hashed.iter().try_fold(0u64, |total, path| {
        fs::metadata(dir.join(path))
            .map(|m| total + m.len())
            .map_err(|e| ErrorKind::Creation(format!("unable to stat {}: {e}", path.display())))
    })?;
    let oxum = PayloadOxum { octets, files: u64::try_from(payload.len()).unwrap_or(u64::MAX) };

    let declaration = tagfile::render([("BagIt-Version", BAGIT_VERSION), ("Tag-File-Character-Encoding", "UTF-8")]);
    write(dir, BAGIT_TXT, &declaration)?;
    write(dir, BAG_INFO_TXT, &render_bag_info(&options.bag_info, oxum)?)?;

    let mut tag_files = vec![PathBuf::from(BAGIT_TXT), PathBuf::from(BAG_INFO_TXT)];
    tag_files.extend(algorithms.iter().map(|a| PathBuf::from(Family::Payload.file_name(*a))));
    write_manifests(dir, Family::Tag, &tag_files, &algorithms, options.processes)?;

    Bag::open(dir).map_err(|e| ErrorKind::Creation(format!("created bag could not be reopened: {}", *e)).into())
}

/// Manifests are UTF-8 text, so a payload name that is not valid UTF-8 could
/// never be listed faithfully. Nothing has been moved when this fails.
fn reject_non_utf8_names(dir: &Path) -> Result<()> {
    for entry in WalkDir::new(dir).min_depth(1).follow_links(true) {
        let entry = entry.map_err(|e| ErrorKind::Creation(format!("unable to walk {}: {e}", dir.display())))?;
        let relative = entry.path().strip_prefix(dir).map_err(|e| ErrorKind::Creation(e.to_string()))?;
        if relative.to_str().is_none() {
            exn::bail!(ErrorKind::Creation(format!("{} is not a valid UTF-8 file name", relative.display())));
        }
    }
    Ok(())
}

/// Moves every entry of `dir` into a fresh temporary directory, then renames
/// that directory to `data`. The temporary directory lives inside `dir` so
/// that every rename stays on one filesystem.
fn move_into_payload(dir: &Path) -> Result<()> {
    let entries: Vec<PathBuf> = fs::read_dir(dir)
        .and_then(|listing| listing.map(|entry| entry.map(|e| e.path())).collect::<std::io::Result<Vec<_>>>())
        .map_err(|e| ErrorKind::Creation(format!("unable to list {}: {e}", dir.display())))?;
    let staging = tempfile::Builder::new()
        .prefix(".grabbags-")
        .tempdir_in(dir)
        .map_err(|e| ErrorKind::Creation(format!("unable to create staging directory: {e}")))?
        // Never let the drop guard delete a directory that holds the payload.
        .keep();

    let mut moved: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(entries.len());
    for source in entries {
        let Some(name) = source.file_name() else {
            continue;
        };
        let target = staging.join(name);
        tracing::debug!(from = %source.display(), to = %target.display(), "Moving into payload");
        if let Err(e) = fs::rename(&source, &target) {
            restore(&moved, &staging);
            exn::bail!(ErrorKind::Creation(format!("unable to move {}: {e}", source.display())));
        }
        moved.push((source, target));
    }
    if let Err(e) = fs::rename(&staging, dir.join(DATA_DIR)) {
        restore(&moved, &staging);
        exn::bail!(ErrorKind::Creation(format!("unable to create {DATA_DIR} directory: {e}")));
    }
    Ok(())
}

fn restore(moved: &[(PathBuf, PathBuf)], staging: &Path) {
    for (original, current) in moved.iter().rev() {
        if let Err(e) = fs::rename(current, original) {
            tracing::error!(path = %original.display(), error = %e, "Unable to restore file after failed bag creation");
        }
    }
    _ = fs::remove_dir(staging);
}

/// Writes one manifest per algorithm for `files`, returning the files hashed.
fn write_manifests(
    dir: &Path,
    family: Family,
    files: &[PathBuf],
    algorithms: &[Algorithm],
    processes: usize,
) -> Result<Vec<PathBuf>> {
    let results = digest_files(dir, files, algorithms, processes)
        .map_err(|e| ErrorKind::Creation(format!("unable to calculate checksums: {}", *e)))?;
    let mut columns: Vec<Vec<(PathBuf, String)>> = vec![Vec::with_capacity(results.len()); algorithms.len()];
    let mut hashed = Vec::with_capacity(results.len());
    for (path, digests) in results {
        let digests =
            digests.map_err(|e| ErrorKind::Creation(format!("unable to read {}: {e}", path.display())))?;
        for (column, digest) in columns.iter_mut().zip(digests) {
            column.push((path.clone(), digest));
        }
        hashed.push(path);
    }
    for (algorithm, column) in algorithms.iter().zip(columns) {
        let contents = manifest::render(column.iter().map(|(p, d)| (p.as_path(), d.as_str())));
        write(dir, &family.file_name(*algorithm), &contents)?;
    }
    Ok(hashed)
}

fn render_bag_info(user: &BTreeMap<String, String>, oxum: PayloadOxum) -> Result<String> {
    let mut tags: BTreeMap<String, String> = user.clone();
    if !tags.keys().any(|k| k.eq_ignore_ascii_case("Bagging-Date")) {
        let today = OffsetDateTime::now_utc()
            .format(format_description!("[year]-[month]-[day]"))
            .map_err(|e| ErrorKind::Creation(format!("unable to format Bagging-Date: {e}")))?;
        tags.insert("Bagging-Date".to_string(), today);
    }
    tags.insert("Bag-Software-Agent".to_string(), SOFTWARE_AGENT.to_string());
    tags.insert("Payload-Oxum".to_string(), oxum.to_string());
    Ok(tagfile::render(tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))))
}

fn write(dir: &Path, name: &str, contents: &str) -> Result<()> {
    fs::write(dir.join(name), contents)
        .map_err(|e| ErrorKind::Creation(format!("unable to write {name}: {e}")).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bag::ValidateOptions;

    fn populated() -> tempfile::TempDir {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("text.txt"), b"hello bag").unwrap();
        fs::create_dir_all(temp_dir.path().join("nested/deeper")).unwrap();
        fs::write(temp_dir.path().join("nested/deeper/more.txt"), b"more").unwrap();
        temp_dir
    }

    #[test]
    fn test_make_bag_layout() {
        let temp_dir = populated();
        let bag = make_bag(temp_dir.path(), &CreateOptions::default()).unwrap();
        let root = temp_dir.path();
        assert_eq!(fs::read(root.join("data/text.txt")).unwrap(), b"hello bag");
        assert!(root.join("data/nested/deeper/more.txt").is_file());
        assert!(!root.join("text.txt").exists());
        for name in ["bagit.txt", "bag-info.txt", "manifest-sha256.txt", "manifest-sha512.txt"] {
            assert!(root.join(name).is_file(), "{name} missing");
        }
        assert!(root.join("tagmanifest-sha256.txt").is_file());
        assert_eq!(bag.info_value("Payload-Oxum"), Some("13.2"));
        assert_eq!(bag.version(), Some(BAGIT_VERSION));
        // No staging directories left behind.
        let leftovers = fs::read_dir(root)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(".grabbags-"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_make_bag_then_validate() {
        let temp_dir = populated();
        let options = CreateOptions { processes: 2, ..CreateOptions::default() };
        let bag = make_bag(temp_dir.path(), &options).unwrap();
        bag.validate(&ValidateOptions::default()).unwrap();
        bag.validate(&ValidateOptions { fast: true, ..ValidateOptions::default() }).unwrap();
    }

    #[test]
    fn test_make_bag_user_metadata_and_algorithms() {
        let temp_dir = populated();
        let options = CreateOptions {
            bag_info: BTreeMap::from([("Source-Organization".to_string(), "AMIA".to_string())]),
            processes: 1,
            algorithms: vec![Algorithm::Sha384],
        };
        let bag = make_bag(temp_dir.path(), &options).unwrap();
        assert_eq!(bag.info_value("Source-Organization"), Some("AMIA"));
        assert_eq!(bag.algorithms(), vec![Algorithm::Sha384]);
        assert!(!temp_dir.path().join("manifest-sha256.txt").exists());
    }

    #[test]
    fn test_make_bag_rejects_files() {
        let temp_dir = populated();
        let err = make_bag(&temp_dir.path().join("text.txt"), &CreateOptions::default()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Creation(_)));
    }

    #[test]
    fn test_special_file_names_round_trip() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("Icon\r"), b"").unwrap();
        fs::write(temp_dir.path().join("100%.txt"), b"percent").unwrap();
        let bag = make_bag(temp_dir.path(), &CreateOptions::default()).unwrap();
        bag.validate(&ValidateOptions::default()).unwrap();
        let (missing, extra) = bag.compare_manifests_with_fs().unwrap();
        assert!(missing.is_empty() && extra.is_empty());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_name_is_rejected_before_moving() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = populated();
        let name = OsStr::from_bytes(b"caf\xE9.txt");
        fs::write(temp_dir.path().join("nested").join(name), b"latin-1").unwrap();

        let err = make_bag(temp_dir.path(), &CreateOptions::default()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Creation(reason) if reason.contains("not a valid UTF-8 file name")));
        assert!(temp_dir.path().join("nested").join(name).is_file());
        assert!(temp_dir.path().join("text.txt").is_file());
        assert!(!temp_dir.path().join(DATA_DIR).exists());
        assert!(!temp_dir.path().join(BAGIT_TXT).exists());
    }
}
