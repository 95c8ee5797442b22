//! Identity error types

use thiserror::Error;

/// Errors from identity-provider and registry calls
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// Provider-side failure (CA unreachable, signing rejected, ...)
    #[error("identity provider error: {0}")]
    Provider(String),
    /// The referenced key does not exist at the provider
    #[error("key {0} not found")]
    KeyNotFound(u64),
    /// The referenced organization does not exist in the registry
    #[error("organization {0} not found")]
    OrganizationNotFound(u64),
    /// An identity has no signing-CA reference and none could be derived
    #[error("key {key_id} has no signing CA associated")]
    MissingSigningCa {
        /// The key lacking a CA reference
        key_id: u64,
    },
}
