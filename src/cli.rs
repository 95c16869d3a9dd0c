use clap::{Args, CommandFactory, Parser};
use grabbags_bagit::Algorithm;
use grabbags_batch::{ActionKind, Options};
use grabbags_config::Settings;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::PathBuf;

const ABOUT: &str = "Bag, validate or clean every subdirectory of the given directories";

const LONG_ABOUT: &str = "\
Bags every subdirectory of the given directories in place, moving their
existing files into the BagIt structure and writing manifests and other
metadata next to them.

Subdirectories from several parent directories can be processed at once:
    grabbags directory1 directory2

Metadata for bag-info.txt can be given on the command line:
    grabbags --source-organization \"Library of Congress\" directory

Manifest algorithms can be selected explicitly:
    grabbags --sha256 --sha512 directory";

#[derive(Debug, Parser)]
#[command(name = "grabbags", version, about = ABOUT, long_about = LONG_ABOUT)]
pub struct Cli {
    /// Parent directories whose subdirectories are processed.
    #[arg(required = true, num_args = 1.., value_name = "DIRECTORY")]
    pub directories: Vec<PathBuf>,

    /// Validate existing bags instead of creating new ones.
    #[arg(long, conflicts_with = "clean")]
    pub validate: bool,

    /// Remove system files that are not in a bag's manifest. The following
    /// files are deleted: .DS_Store, Thumbs.db, AppleDoubles (._*), Icon files.
    #[arg(long)]
    pub clean: bool,

    /// Threads used to calculate checksums [default: 1]
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub processes: Option<i64>,

    /// With --validate, only compare the Payload-Oxum file count and size.
    #[arg(long)]
    pub fast: bool,

    /// With --validate, check that the payload matches the manifests without
    /// comparing checksums.
    #[arg(long, visible_alias = "completeness-only")]
    pub no_checksums: bool,

    /// Delete system files before bagging. The following files are deleted:
    /// .DS_Store, Thumbs.db, AppleDoubles (._*), Icon files.
    #[arg(long)]
    pub no_system_files: bool,

    #[command(flatten)]
    pub checksums: ChecksumArgs,

    #[command(flatten)]
    pub bag_info: BagInfoArgs,

    /// Write the log to FILE instead of standard error.
    #[arg(long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Suppress all progress information other than warnings and errors.
    #[arg(long, short)]
    pub quiet: bool,

    /// Read defaults from FILE (TOML, YAML or JSON).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args)]
#[command(next_help_heading = "Checksum Algorithms")]
pub struct ChecksumArgs {
    /// Generate a SHA-224 manifest when creating a bag.
    #[arg(long)]
    pub sha224: bool,
    /// Generate a SHA-256 manifest when creating a bag.
    #[arg(long)]
    pub sha256: bool,
    /// Generate a SHA-384 manifest when creating a bag.
    #[arg(long)]
    pub sha384: bool,
    /// Generate a SHA-512 manifest when creating a bag.
    #[arg(long)]
    pub sha512: bool,
}

impl ChecksumArgs {
    pub fn selected(&self) -> Vec<Algorithm> {
        [
            (self.sha224, Algorithm::Sha224),
            (self.sha256, Algorithm::Sha256),
            (self.sha384, Algorithm::Sha384),
            (self.sha512, Algorithm::Sha512),
        ]
        .into_iter()
        .filter_map(|(selected, algorithm)| selected.then_some(algorithm))
        .collect()
    }
}

#[derive(Debug, Args)]
#[command(next_help_heading = "Optional Bag Metadata")]
pub struct BagInfoArgs {
    #[arg(long, value_name = "VALUE")]
    pub source_organization: Option<String>,
    #[arg(long, value_name = "VALUE")]
    pub organization_address: Option<String>,
    #[arg(long, value_name = "VALUE")]
    pub contact_name: Option<String>,
    #[arg(long, value_name = "VALUE")]
    pub contact_phone: Option<String>,
    #[arg(long, value_name = "VALUE")]
    pub contact_email: Option<String>,
    #[arg(long, value_name = "VALUE")]
    pub external_description: Option<String>,
    #[arg(long, value_name = "VALUE")]
    pub external_identifier: Option<String>,
    #[arg(long, value_name = "VALUE")]
    pub bag_size: Option<String>,
    #[arg(long, value_name = "VALUE")]
    pub bag_group_identifier: Option<String>,
    #[arg(long, value_name = "VALUE")]
    pub bag_count: Option<String>,
    #[arg(long, value_name = "VALUE")]
    pub internal_sender_identifier: Option<String>,
    #[arg(long, value_name = "VALUE")]
    pub internal_sender_description: Option<String>,
    #[arg(long, value_name = "VALUE")]
    pub bagit_profile_identifier: Option<String>,
}

impl BagInfoArgs {
    /// The given headers, keyed by their `bag-info.txt` label.
    pub fn tags(&self) -> BTreeMap<String, String> {
        [
            ("Source-Organization", &self.source_organization),
            ("Organization-Address", &self.organization_address),
            ("Contact-Name", &self.contact_name),
            ("Contact-Phone", &self.contact_phone),
            ("Contact-Email", &self.contact_email),
            ("External-Description", &self.external_description),
            ("External-Identifier", &self.external_identifier),
            ("Bag-Size", &self.bag_size),
            ("Bag-Group-Identifier", &self.bag_group_identifier),
            ("Bag-Count", &self.bag_count),
            ("Internal-Sender-Identifier", &self.internal_sender_identifier),
            ("Internal-Sender-Description", &self.internal_sender_description),
            ("BagIt-Profile-Identifier", &self.bagit_profile_identifier),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.as_ref().map(|v| (label.to_string(), v.clone())))
        .collect()
    }
}

impl Cli {
    pub fn kind(&self) -> ActionKind {
        match (self.validate, self.clean) {
            (true, _) => ActionKind::Validate,
            (_, true) => ActionKind::Clean,
            _ => ActionKind::Create,
        }
    }

    /// Combines the flags with user defaults. Flags win; checksum defaults
    /// are applied after resolution so they never conflict with --validate
    /// or --clean.
    pub fn options(&self, settings: &Settings) -> Options {
        let mut bag_info = settings.bag_info.clone();
        bag_info.extend(self.bag_info.tags());
        Options {
            kind: self.kind(),
            processes: self.processes.unwrap_or(settings.processes),
            fast: self.fast,
            completeness_only: self.no_checksums,
            strip_system_files: self.no_system_files,
            checksums: self.checksums.selected(),
            bag_info,
        }
    }
}

/// Reports a configuration problem the way clap reports usage errors, and
/// exits with status 2.
pub fn usage_error(message: impl Display) -> ! {
    Cli::command().error(clap::error::ErrorKind::ArgumentConflict, message).exit()
}
