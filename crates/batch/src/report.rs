use crate::action::ActionKind;
use crate::outcome::detail;
use crate::runner::BatchResult;
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Severity {
    Info,
    Warn,
}

/// Human readable summary of a [`BatchResult`].
///
/// `Display` renders one line per fact; [`Report::log`] emits the same lines
/// as tracing events, with problems at warning level.
pub struct Report<'a> {
    result: &'a BatchResult,
}

impl<'a> Report<'a> {
    pub(crate) fn new(result: &'a BatchResult) -> Self {
        Self { result }
    }

    pub fn log(&self) {
        for (severity, line) in self.lines() {
            match severity {
                Severity::Info => tracing::info!("{line}"),
                Severity::Warn => tracing::warn!("{line}"),
            }
        }
    }

    fn lines(&self) -> Vec<(Severity, String)> {
        let result = self.result;
        let kind = result.kind();
        let verb = kind.verb();
        let mut lines = vec![(Severity::Info, format!("{} bags {verb} successfully", result.successes().len()))];
        if !result.failures().is_empty() {
            lines.push((Severity::Warn, format!("{} bags not {verb}", result.failures().len())));
            lines.push((Severity::Warn, format!("Failed for the following folders: {}", join(result.failures()))));
        }
        if !result.not_a_package().is_empty() {
            lines.push((Severity::Warn, format!("{} folders are not bags", result.not_a_package().len())));
            let names = join(result.not_a_package());
            lines.push((Severity::Warn, format!("The following folders are not bags: {names}")));
        }
        match kind {
            ActionKind::Create if !result.skipped().is_empty() => lines.push((
                Severity::Info,
                format!(
                    "{} folders skipped: {} already bags, {} empty",
                    result.skipped().len(),
                    result.total(detail::ALREADY_A_PACKAGE),
                    result.total(detail::EMPTY_DIRECTORY)
                ),
            )),
            ActionKind::Clean if !result.successes().is_empty() => {
                lines.push((Severity::Info, format!("{} system files removed", result.total(detail::REMOVED))));
                let unmanifested = result.total(detail::UNMANIFESTED);
                if unmanifested > 0 {
                    lines.push((Severity::Warn, format!("{unmanifested} files not in manifest left in place")));
                }
            },
            _ => (),
        }
        lines
    }
}

impl Display for Report<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (_, line) in self.lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

fn join(paths: &[PathBuf]) -> String {
    paths.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
}
