use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber.
///
/// Progress is logged at INFO, or only warnings and errors when `quiet` is
/// set. `RUST_LOG` replaces either level. With `file`, events are appended to
/// that file without colour codes.
pub fn init(quiet: bool, file: Option<&Path>) -> Result<()> {
    let level = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    let installed = match file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .or_raise(|| ErrorKind::LogFile(path.to_path_buf()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
        },
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    installed.map_err(|_| ErrorKind::Subscriber)?;
    Ok(())
}
