//! CLI error types

use thiserror::Error;

/// CLI error type
#[derive(Debug, Error)]
pub enum CliError {
    /// Descriptor file could not be parsed or is inconsistent
    #[error("Invalid descriptor: {0}")]
    Descriptor(String),

    /// Deployment mode is not supported
    #[error("Unsupported mode: {0}")]
    Mode(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Process supervision error
    #[error("Supervision error: {0}")]
    Supervise(#[from] quay_supervise::SuperviseError),

    /// Channel participation error
    #[error("Participation error: {0}")]
    Channel(#[from] quay_channel::ChannelError),

    /// Lifecycle error
    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] quay_lifecycle::LifecycleError),
}
