//! Checksum algorithms usable in payload and tag manifests.

use crate::error::{Error, ErrorKind};
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use std::fmt::{self, Display, Formatter};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

/// Manifests written when the caller does not ask for anything specific.
pub const DEFAULT_ALGORITHMS: &[Algorithm] = &[Algorithm::Sha256, Algorithm::Sha512];

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// A supported manifest checksum algorithm.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(try_from = "String", into = "String")
)]
pub enum Algorithm {
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl Algorithm {
    pub const ALL: [Algorithm; 4] = [Self::Sha224, Self::Sha256, Self::Sha384, Self::Sha512];

    /// Name used in manifest file names (`manifest-<name>.txt`).
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    /// Accepts both manifest names (`sha256`) and labels (`SHA-256`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "");
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.name() == normalized)
            .ok_or_else(|| exn::Exn::from(ErrorKind::UnsupportedAlgorithm(s.to_string())))
    }
}

impl TryFrom<String> for Algorithm {
    type Error = ErrorKind;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse::<Self>().map_err(|e| (*e).clone())
    }
}

impl From<Algorithm> for String {
    fn from(value: Algorithm) -> Self {
        value.name().to_string()
    }
}

/// Incremental digest state for one algorithm.
enum Hasher {
    Sha224(Sha224),
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
}

impl Hasher {
    fn new(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Sha224 => Self::Sha224(Sha224::new()),
            Algorithm::Sha256 => Self::Sha256(Sha256::new()),
            Algorithm::Sha384 => Self::Sha384(Sha384::new()),
            Algorithm::Sha512 => Self::Sha512(Sha512::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha224(h) => h.update(data),
            Self::Sha256(h) => h.update(data),
            Self::Sha384(h) => h.update(data),
            Self::Sha512(h) => h.update(data),
        }
    }

    fn finalize(self) -> String {
        match self {
            Self::Sha224(h) => format!("{:x}", h.finalize()),
            Self::Sha256(h) => format!("{:x}", h.finalize()),
            Self::Sha384(h) => format!("{:x}", h.finalize()),
            Self::Sha512(h) => format!("{:x}", h.finalize()),
        }
    }
}

/// Digests a reader once, feeding every requested algorithm from the same
/// buffer. Digests are returned in the order of `algorithms`.
pub fn hash_reader<R: Read>(mut reader: R, algorithms: &[Algorithm]) -> io::Result<Vec<String>> {
    let mut hashers: Vec<Hasher> = algorithms.iter().copied().map(Hasher::new).collect();
    let mut buffer = vec![0; READ_BUFFER_SIZE];
    loop {
        let bytes = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        for hasher in &mut hashers {
            hasher.update(&buffer[..bytes]);
        }
    }
    Ok(hashers.into_iter().map(Hasher::finalize).collect())
}

pub fn hash_file(path: impl AsRef<Path>, algorithms: &[Algorithm]) -> io::Result<Vec<String>> {
    hash_reader(File::open(path)?, algorithms)
}
