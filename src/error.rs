use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

/// Failures that stop the program after the command line was accepted.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("unable to open log file {}", _0.display())]
    LogFile(#[error(not(source))] PathBuf),
    #[display("unable to install the log subscriber")]
    Subscriber,
    #[display("batch run aborted")]
    Batch,
}
