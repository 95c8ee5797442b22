//! Error types for quay-types

use thiserror::Error;

/// Errors raised while parsing or validating descriptor fields
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    /// Address did not parse as host:port
    #[error("invalid endpoint '{0}': expected host:port")]
    InvalidEndpoint(String),
    /// Deployment mode is not one of the supported strategies
    #[error("unsupported deployment mode '{0}'")]
    UnsupportedMode(String),
    /// A descriptor field required for the requested operation is missing
    #[error("missing descriptor field: {0}")]
    MissingField(&'static str),
}
