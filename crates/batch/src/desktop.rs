//! Adapter for the drag-and-drop front-end.
//!
//! The window exposes a handful of checkboxes and accepts dropped folders.
//! Checkbox state maps straight onto [`Options`]; it never goes through
//! command-line text.

use crate::action::ActionKind;
use crate::error::{ErrorKind, Result};
use crate::options::{Options, Plan};
use std::path::Path;

pub const OPTION_VALIDATE: &str = "optionValidate";
pub const OPTION_NO_CHECKSUM: &str = "optionNoChecksum";
pub const OPTION_FAST: &str = "optionFast";
pub const OPTION_NO_SYSTEM_FILES: &str = "optionNoSystemFiles";

/// Builds [`Options`] from checkbox identifiers and their checked state.
/// Unknown identifiers are ignored.
pub fn options_from_checkboxes<'a>(checkboxes: impl IntoIterator<Item = (&'a str, bool)>) -> Options {
    let mut options = Options::default();
    for (name, checked) in checkboxes {
        match name {
            OPTION_VALIDATE => {
                if checked {
                    options.kind = ActionKind::Validate;
                }
            },
            OPTION_NO_CHECKSUM => options.completeness_only = checked,
            OPTION_FAST => options.fast = checked,
            OPTION_NO_SYSTEM_FILES => options.strip_system_files = checked,
            _ => tracing::trace!(option = name, "Ignoring unrecognised checkbox"),
        }
    }
    options
}

/// Rejects a drop unless every path is an existing directory.
pub fn check_dropped<P: AsRef<Path>>(paths: &[P]) -> Result<()> {
    if paths.iter().all(|p| p.as_ref().is_dir()) {
        return Ok(());
    }
    exn::bail!(ErrorKind::Configuration("Input accepts only folders".to_string()));
}

/// Validates a drop and resolves the checkbox state into a run plan.
pub fn plan<'a, P: AsRef<Path>>(
    dropped: &[P],
    checkboxes: impl IntoIterator<Item = (&'a str, bool)>,
) -> Result<Plan> {
    check_dropped(dropped)?;
    options_from_checkboxes(checkboxes).resolve()
}
