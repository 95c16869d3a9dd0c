//! Payload and tag manifests: `<digest> <path>` lines, one file per algorithm.

use crate::algorithm::Algorithm;
use crate::error::{ErrorKind, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

pub(crate) const PAYLOAD_PREFIX: &str = "manifest-";
pub(crate) const TAG_PREFIX: &str = "tagmanifest-";
const SUFFIX: &str = ".txt";

/// Which of the two manifest families a file belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Family {
    Payload,
    Tag,
}

impl Family {
    pub(crate) fn file_name(&self, algorithm: Algorithm) -> String {
        match self {
            Self::Payload => format!("{PAYLOAD_PREFIX}{algorithm}{SUFFIX}"),
            Self::Tag => format!("{TAG_PREFIX}{algorithm}{SUFFIX}"),
        }
    }

    /// Splits a bag-root file name into its family and algorithm name, e.g.
    /// `tagmanifest-sha256.txt` into `(Tag, "sha256")`.
    pub(crate) fn classify(file_name: &str) -> Option<(Self, &str)> {
        let stem = file_name.strip_suffix(SUFFIX)?;
        // Check the longer prefix first, "tagmanifest-" ends with "manifest-".
        if let Some(algorithm) = stem.strip_prefix(TAG_PREFIX) {
            return Some((Self::Tag, algorithm));
        }
        stem.strip_prefix(PAYLOAD_PREFIX).map(|algorithm| (Self::Payload, algorithm))
    }
}

/// A parsed manifest: bag-relative paths mapped to expected digests.
#[derive(Debug, Clone)]
pub(crate) struct Manifest {
    pub(crate) algorithm: Algorithm,
    pub(crate) entries: BTreeMap<PathBuf, String>,
}

impl Manifest {
    pub(crate) fn read(path: &Path, algorithm: Algorithm) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| ErrorKind::InvalidBag(format!("unable to read {}: {e}", path.display())))?;
        let entries = parse(&text).map_err(|e| ErrorKind::InvalidBag(format!("{}: {}", path.display(), *e)))?;
        Ok(Self { algorithm, entries })
    }
}

fn parse(text: &str) -> Result<BTreeMap<PathBuf, String>> {
    let mut entries = BTreeMap::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim_start_matches('\u{feff}');
        if line.trim().is_empty() {
            continue;
        }
        let Some((digest, path)) = line.split_once(char::is_whitespace) else {
            exn::bail!(ErrorKind::InvalidBag(format!("malformed manifest line {}", number + 1)));
        };
        let path = decode_path(path.trim_start())?;
        entries.insert(path, digest.to_ascii_lowercase());
    }
    Ok(entries)
}

pub(crate) fn render<'a>(entries: impl IntoIterator<Item = (&'a Path, &'a str)>) -> String {
    entries.into_iter().map(|(path, digest)| format!("{digest}  {}\n", encode_path(path))).collect()
}

/// Renders a bag-relative path with `/` separators, percent-encoding the
/// characters that would otherwise break the line format.
pub(crate) fn encode_path(path: &Path) -> String {
    let joined = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");
    joined.replace('%', "%25").replace('\r', "%0D").replace('\n', "%0A")
}

/// Inverse of [`encode_path`]. Rejects paths that would escape the bag.
pub(crate) fn decode_path(encoded: &str) -> Result<PathBuf> {
    let decoded = encoded
        .replace("%0A", "\n")
        .replace("%0a", "\n")
        .replace("%0D", "\r")
        .replace("%0d", "\r")
        .replace("%25", "%");
    let mut path = PathBuf::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {},
            ".." => exn::bail!(ErrorKind::InvalidBag(format!("manifest path escapes the bag: {encoded}"))),
            segment => path.push(segment),
        }
    }
    if path.as_os_str().is_empty() || decoded.starts_with('/') {
        exn::bail!(ErrorKind::InvalidBag(format!("unsafe manifest path: {encoded}")));
    }
    Ok(path)
}
