//! User defaults for grabbags.
//!
//! Settings are merged from several layers, each overriding the last:
//!
//! 1. Built-in defaults ([`Settings::default`]).
//! 2. `grabbags.toml`, `grabbags.yaml` and `grabbags.json` in the platform
//!    configuration directory (e.g. `~/.config/grabbags/` on Linux).
//! 3. A file passed explicitly with `--config`, in any of those formats.
//! 4. `GRABBAGS_*` environment variables, e.g. `GRABBAGS_PROCESSES=4`.
//!
//! Command-line flags are applied on top by the binary.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use grabbags_bagit::Algorithm;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "GRABBAGS_";
const FILE_STEM: &str = "grabbags";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Checksum worker threads.
    pub processes: i64,
    /// Manifest algorithms for new bags. Empty uses the package defaults.
    pub checksums: Vec<Algorithm>,
    /// Tags added to every new bag's `bag-info.txt`.
    pub bag_info: BTreeMap<String, String>,
    /// Only log warnings and errors.
    pub quiet: bool,
    /// Write the log to this file instead of standard error.
    pub log: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self { processes: 1, checksums: Vec::new(), bag_info: BTreeMap::new(), quiet: false, log: None }
    }
}

impl Settings {
    /// Loads settings from every layer, using the platform configuration
    /// directory for user files.
    ///
    /// # Errors
    /// [`ErrorKind::NotFound`] if `explicit` does not exist, and
    /// [`ErrorKind::Invalid`] if any layer cannot be parsed.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let dirs = ProjectDirs::from("org", "amiaopensource", FILE_STEM);
        Self::load_from(dirs.as_ref().map(ProjectDirs::config_dir), explicit)
    }

    /// As [`Settings::load`], reading user files from `config_dir`.
    pub fn load_from(config_dir: Option<&Path>, explicit: Option<&Path>) -> Result<Self> {
        Self::figment(config_dir, explicit)?.extract().map_err(|e| ErrorKind::Invalid(e.to_string()).into())
    }

    fn figment(config_dir: Option<&Path>, explicit: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));
        if let Some(dir) = config_dir {
            tracing::debug!(dir = %dir.display(), "Looking for user configuration");
            figment = figment
                .merge(Toml::file(dir.join(format!("{FILE_STEM}.toml"))))
                .merge(Yaml::file(dir.join(format!("{FILE_STEM}.yaml"))))
                .merge(Json::file(dir.join(format!("{FILE_STEM}.json"))));
        }
        if let Some(path) = explicit {
            if !path.is_file() {
                exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
            }
            tracing::debug!(path = %path.display(), "Loading configuration file");
            figment = match path.extension().and_then(|e| e.to_str()) {
                Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                _ => figment.merge(Toml::file(path)),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX)))
    }
}
