//! Reading and writing `Label: Value` tag files (`bagit.txt`, `bag-info.txt`).

use crate::error::{ErrorKind, Result};
use std::fs;
use std::path::Path;

/// Ordered tag entries. Labels may repeat, so this is not a map.
pub type Tags = Vec<(String, String)>;

/// Parses tag file contents. Lines beginning with whitespace continue the
/// value of the previous tag.
pub(crate) fn parse(text: &str) -> Result<Tags> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut tags: Tags = Vec::new();
    for (number, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with([' ', '\t']) {
            let Some((_, value)) = tags.last_mut() else {
                exn::bail!(ErrorKind::InvalidBag(format!("continuation line {} has no tag to continue", number + 1)));
            };
            value.push(' ');
            value.push_str(line.trim());
            continue;
        }
        let Some((label, value)) = line.split_once(':') else {
            exn::bail!(ErrorKind::InvalidBag(format!("unable to parse tag line {}: {line:?}", number + 1)));
        };
        tags.push((label.trim().to_string(), value.trim().to_string()));
    }
    Ok(tags)
}

pub(crate) fn read(path: &Path) -> Result<Tags> {
    let text = fs::read_to_string(path)
        .map_err(|e| ErrorKind::InvalidBag(format!("unable to read {}: {e}", path.display())))?;
    parse(&text)
}

pub(crate) fn render<'a>(tags: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    tags.into_iter().map(|(label, value)| format!("{label}: {value}\n")).collect()
}

/// First value recorded for `label`, compared case-insensitively.
pub(crate) fn lookup<'a>(tags: &'a Tags, label: &str) -> Option<&'a str> {
    tags.iter().find(|(l, _)| l.eq_ignore_ascii_case(label)).map(|(_, v)| v.as_str())
}
