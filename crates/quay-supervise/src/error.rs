//! Supervision error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors from service-manager and container-runtime control
#[derive(Debug, Error)]
pub enum SuperviseError {
    /// A control operation could not be carried out
    #[error("process control failed during {operation}: {detail}")]
    ProcessControl {
        /// Operation being attempted (e.g. "start", "stop")
        operation: String,
        /// What went wrong
        detail: String,
    },
    /// An external command ran and exited non-zero
    #[error("'{program} {subcommand}' exited with status {status}: {stderr}")]
    CommandFailed {
        /// Program invoked
        program: String,
        /// First argument, for diagnosis
        subcommand: String,
        /// Exit status
        status: i32,
        /// Captured standard error
        stderr: String,
    },
    /// The external command could not be spawned at all
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        /// Program that failed to spawn
        program: String,
        /// Underlying cause
        #[source]
        source: std::io::Error,
    },
    /// Filesystem operation failed
    #[error("io error at {path}: {source}")]
    Io {
        /// Path involved
        path: PathBuf,
        /// Underlying cause
        #[source]
        source: std::io::Error,
    },
    /// No output sink exists yet: the node was never started
    #[error("no log sink exists for this node yet")]
    LogsUnavailable,
}

impl SuperviseError {
    pub(crate) fn control(operation: &str, detail: impl Into<String>) -> Self {
        Self::ProcessControl {
            operation: operation.to_string(),
            detail: detail.into(),
        }
    }
}
