//! Material generation errors

use std::path::PathBuf;
use thiserror::Error;

/// Errors from directory and file generation
#[derive(Debug, Error)]
pub enum MaterialError {
    /// Filesystem operation failed
    #[error("io error at {path}: {source}")]
    Io {
        /// Path being created or written
        path: PathBuf,
        /// Underlying cause
        #[source]
        source: std::io::Error,
    },
}

impl MaterialError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
