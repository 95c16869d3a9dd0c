//! Opening and validating existing bags.

use crate::algorithm::Algorithm;
use crate::checksum::digest_files;
use crate::error::{ErrorKind, Result};
use crate::manifest::{Family, Manifest};
use crate::tagfile::{self, Tags};
use crate::{BAG_INFO_TXT, BAGIT_TXT, DATA_DIR};
use exn::ResultExt;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::instrument;
use walkdir::WalkDir;

/// How thoroughly [`Bag::validate`] should check the payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Concurrency hint for checksum calculation.
    pub processes: usize,
    /// Only compare the Payload-Oxum (total size and file count).
    pub fast: bool,
    /// Check that manifests and payload list the same files, but skip checksums.
    pub completeness_only: bool,
}

/// Total payload size and file count, written as `<octets>.<files>`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PayloadOxum {
    pub octets: u64,
    pub files: u64,
}

impl PayloadOxum {
    /// Measures every regular file under `data_dir`.
    pub fn measure(data_dir: &Path) -> Result<Self> {
        let mut oxum = Self::default();
        for entry in WalkDir::new(data_dir).follow_links(true) {
            let entry = entry.or_raise(|| ErrorKind::Io)?;
            if entry.file_type().is_file() {
                oxum.octets += entry.metadata().or_raise(|| ErrorKind::Io)?.len();
                oxum.files += 1;
            }
        }
        Ok(oxum)
    }
}

impl Display for PayloadOxum {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.octets, self.files)
    }
}

impl FromStr for PayloadOxum {
    type Err = ErrorKind;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || ErrorKind::InvalidBag(format!("malformed Payload-Oxum: {s}"));
        let (octets, files) = s.trim().split_once('.').ok_or_else(invalid)?;
        Ok(Self {
            octets: octets.parse().map_err(|_| invalid())?,
            files: files.parse().map_err(|_| invalid())?,
        })
    }
}

/// An existing bag on disk, with its tag files and manifests loaded.
#[derive(Debug, Clone)]
pub struct Bag {
    root: PathBuf,
    declaration: Tags,
    info: Tags,
    manifests: Vec<Manifest>,
    tag_manifests: Vec<Manifest>,
}

impl Bag {
    /// Loads the bag declaration, bag-info and all manifests with a supported
    /// algorithm. Manifests for other algorithms are skipped with a warning.
    #[instrument(skip_all, fields(bag = %root.as_ref().display()))]
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let declaration_path = root.join(BAGIT_TXT);
        if !declaration_path.is_file() {
            exn::bail!(ErrorKind::InvalidBag(format!("expected {BAGIT_TXT} does not exist")));
        }
        let declaration = tagfile::read(&declaration_path)?;
        for required in ["BagIt-Version", "Tag-File-Character-Encoding"] {
            if tagfile::lookup(&declaration, required).is_none() {
                exn::bail!(ErrorKind::InvalidBag(format!("missing required tag in {BAGIT_TXT}: {required}")));
            }
        }
        let info_path = root.join(BAG_INFO_TXT);
        let info = if info_path.is_file() { tagfile::read(&info_path)? } else { Vec::new() };

        let mut manifests = Vec::new();
        let mut tag_manifests = Vec::new();
        let listing = fs::read_dir(&root)
            .map_err(|e| ErrorKind::InvalidBag(format!("unable to list {}: {e}", root.display())))?;
        let mut names: Vec<String> = listing
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        names.sort();
        for name in names {
            let Some((family, algorithm)) = Family::classify(&name) else {
                continue;
            };
            let Ok(algorithm) = algorithm.parse::<Algorithm>() else {
                tracing::warn!(manifest = %name, "Ignoring manifest with unsupported algorithm");
                continue;
            };
            let manifest = Manifest::read(&root.join(&name), algorithm)?;
            match family {
                Family::Payload => manifests.push(manifest),
                Family::Tag => tag_manifests.push(manifest),
            }
        }
        if manifests.is_empty() {
            exn::bail!(ErrorKind::InvalidBag("no supported payload manifest found".to_string()));
        }
        Ok(Self { root, declaration, info, manifests, tag_manifests })
    }

    pub fn version(&self) -> Option<&str> {
        tagfile::lookup(&self.declaration, "BagIt-Version")
    }

    pub fn info_value(&self, label: &str) -> Option<&str> {
        tagfile::lookup(&self.info, label)
    }

    /// Algorithms with a loaded payload manifest.
    pub fn algorithms(&self) -> Vec<Algorithm> {
        self.manifests.iter().map(|m| m.algorithm).collect()
    }

    /// Every path listed in any payload manifest.
    pub fn manifested_files(&self) -> BTreeSet<PathBuf> {
        self.manifests.iter().flat_map(|m| m.entries.keys().cloned()).collect()
    }

    /// Every regular file under the payload directory, relative to the bag root.
    pub fn payload_files(&self) -> Result<BTreeSet<PathBuf>> {
        let mut files = BTreeSet::new();
        for entry in WalkDir::new(self.root.join(DATA_DIR)).follow_links(true) {
            let entry = entry.or_raise(|| ErrorKind::Io)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(&self.root).or_raise(|| ErrorKind::Io)?;
            files.insert(relative.to_path_buf());
        }
        Ok(files)
    }

    /// Compares the payload manifests against the payload directory.
    ///
    /// Returns `(only_in_manifests, only_on_filesystem)`, both sorted and
    /// relative to the bag root.
    pub fn compare_manifests_with_fs(&self) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
        let on_disk = self.payload_files()?;
        let listed = self.manifested_files();
        let only_in_manifests = listed.difference(&on_disk).cloned().collect();
        let only_on_fs = on_disk.difference(&listed).cloned().collect();
        Ok((only_in_manifests, only_on_fs))
    }

    /// Validates the bag, stopping at the first category of problem found.
    ///
    /// 1. Structure: the payload directory exists.
    /// 2. Payload-Oxum: required and sufficient when `fast`, otherwise only
    ///    checked if present.
    /// 3. Completeness: manifests and payload list the same files, and every
    ///    tag manifest entry exists.
    /// 4. Checksums, unless `completeness_only`.
    #[instrument(
        skip_all,
        fields(bag = %self.root.display(), fast = options.fast, completeness_only = options.completeness_only)
    )]
    pub fn validate(&self, options: &ValidateOptions) -> Result<()> {
        self.validate_structure()?;
        if options.fast {
            let Some(expected) = self.payload_oxum()? else {
                exn::bail!(ErrorKind::Validation(
                    "fast validation requires bag-info.txt to include Payload-Oxum".to_string()
                ));
            };
            return self.validate_oxum(expected);
        }
        if let Some(expected) = self.payload_oxum()? {
            self.validate_oxum(expected)?;
        }
        self.validate_completeness()?;
        if !options.completeness_only {
            self.validate_checksums(options.processes)?;
        }
        Ok(())
    }

    fn payload_oxum(&self) -> Result<Option<PayloadOxum>> {
        self.info_value("Payload-Oxum").map(|value| value.parse::<PayloadOxum>().map_err(exn::Exn::from)).transpose()
    }

    fn validate_structure(&self) -> Result<()> {
        if !self.root.join(DATA_DIR).is_dir() {
            exn::bail!(ErrorKind::InvalidBag(format!("expected {DATA_DIR} directory does not exist")));
        }
        Ok(())
    }

    fn validate_oxum(&self, expected: PayloadOxum) -> Result<()> {
        let found = PayloadOxum::measure(&self.root.join(DATA_DIR))?;
        if found != expected {
            exn::bail!(ErrorKind::Validation(format!(
                "Payload-Oxum validation failed. Expected {} files and {} bytes but found {} files and {} bytes",
                expected.files, expected.octets, found.files, found.octets
            )));
        }
        Ok(())
    }

    fn validate_completeness(&self) -> Result<()> {
        let (missing, unexpected) = self.compare_manifests_with_fs()?;
        let mut problems: Vec<String> = Vec::new();
        problems.extend(
            missing.iter().map(|p| format!("{} exists in manifest but was not found on filesystem", p.display())),
        );
        problems.extend(
            unexpected.iter().map(|p| format!("{} exists on filesystem but is not in the manifest", p.display())),
        );
        for manifest in &self.tag_manifests {
            for path in manifest.entries.keys() {
                if !self.root.join(path).is_file() {
                    problems.push(format!("{} exists in tag manifest but was not found on filesystem", path.display()));
                }
            }
        }
        if !problems.is_empty() {
            exn::bail!(ErrorKind::Validation(problems.join("; ")));
        }
        Ok(())
    }

    fn validate_checksums(&self, processes: usize) -> Result<()> {
        // Group expected digests per file so each file is read exactly once.
        let mut expected: BTreeMap<&Path, Vec<(Algorithm, &str)>> = BTreeMap::new();
        for manifest in self.manifests.iter().chain(self.tag_manifests.iter()) {
            for (path, digest) in &manifest.entries {
                expected.entry(path.as_path()).or_default().push((manifest.algorithm, digest.as_str()));
            }
        }
        let files: Vec<PathBuf> = expected.keys().map(|p| p.to_path_buf()).collect();
        let algorithms: Vec<Algorithm> = self
            .manifests
            .iter()
            .chain(self.tag_manifests.iter())
            .map(|m| m.algorithm)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let results = digest_files(&self.root, &files, &algorithms, processes)?;

        let mut problems = Vec::new();
        for (path, digests) in results {
            let digests = match digests {
                Ok(digests) => digests,
                Err(e) => {
                    problems.push(format!("{}: {e}", path.display()));
                    continue;
                },
            };
            for (algorithm, wanted) in &expected[path.as_path()] {
                let Some(found) = algorithms.iter().position(|a| a == algorithm).map(|index| &digests[index]) else {
                    continue;
                };
                if found != wanted {
                    problems.push(format!(
                        "{} {algorithm} validation failed: expected=\"{wanted}\" found=\"{found}\"",
                        path.display()
                    ));
                }
            }
        }
        if !problems.is_empty() {
            exn::bail!(ErrorKind::Validation(problems.join("; ")));
        }
        tracing::debug!(files = files.len(), "All checksums verified");
        Ok(())
    }
}
