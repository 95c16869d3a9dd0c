use crate::algorithm::{Algorithm, hash_file};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use rayon::prelude::*;
use std::io;
use std::path::{Path, PathBuf};

/// Digests of a single file, in the order the algorithms were requested.
pub(crate) type Digests = io::Result<Vec<String>>;

/// Hashes every bag-relative path in `files` with all `algorithms`.
///
/// `processes` is a hint: `0` and `1` hash on the calling thread, anything
/// larger builds a dedicated pool of that many workers for the duration of
/// the call. Results come back in the same order as `files`.
pub(crate) fn digest_files(
    root: &Path,
    files: &[PathBuf],
    algorithms: &[Algorithm],
    processes: usize,
) -> Result<Vec<(PathBuf, Digests)>> {
    let digest = |relative: &PathBuf| (relative.clone(), hash_file(root.join(relative), algorithms));
    if processes <= 1 || files.len() <= 1 {
        return Ok(files.iter().map(digest).collect());
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(processes)
        .thread_name(|index| format!("bagit-checksum-{index}"))
        .build()
        .or_raise(|| ErrorKind::Io)?;
    tracing::debug!(files = files.len(), processes, "Calculating checksums in parallel");
    Ok(pool.install(|| files.par_iter().map(digest).collect()))
}
