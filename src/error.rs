//! Optimizer error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a single optimizer step.
///
/// Resolution misses and unreadable inputs are not errors; they only make
/// an asset ineligible.
#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("cannot create cache directory `{path}`")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write cache artifact `{path}`")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error on `{0}`")]
    Io(PathBuf, #[source] std::io::Error),
}
