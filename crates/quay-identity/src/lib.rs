//! # quay-identity
//!
//! Contracts for the external key-management/CA subsystem and the
//! organization registry, plus the certificate-request types the
//! lifecycle controller builds against them.
//!
//! Nothing in this crate generates or signs keys. The provider is a
//! remote-equivalent collaborator: every call can be slow, every call
//! can fail independently, and no call is retried here. Retry policy
//! belongs to the provider.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod provider;
mod registry;
mod san;
mod types;

pub use error::IdentityError;
pub use provider::{IdentityProvider, MockIdentityProvider};
pub use registry::{InMemoryRegistry, Organization, OrganizationRegistry};
pub use san::normalize_sans;
pub use types::{
    cert_fingerprint, CertRequest, KeyAlgorithm, KeyHandle, SignedKey, DEFAULT_VALIDITY_DAYS,
};

/// Result type for identity operations
pub type IdentityResult<T> = Result<T, IdentityError>;
