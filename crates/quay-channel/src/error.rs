//! Participation client errors

use thiserror::Error;

/// Errors from administrative calls to a node
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// Connection or request-level failure
    #[error("transport error calling {path}: {detail}")]
    Transport {
        /// Request path
        path: String,
        /// What went wrong
        detail: String,
    },
    /// The admin endpoint answered with a non-success status
    #[error("admin endpoint returned {status} for {path}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Request path
        path: String,
        /// Message from the endpoint
        message: String,
    },
    /// Client TLS identity could not be assembled
    #[error("tls identity error: {0}")]
    Tls(String),
    /// Response body did not decode as expected
    #[error("failed to decode admin response from {path}: {detail}")]
    Decode {
        /// Request path
        path: String,
        /// Decode failure detail
        detail: String,
    },
}
