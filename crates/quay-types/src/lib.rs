//! # quay-types
//!
//! Core data model for the Quayside node operations tooling: deployment
//! descriptors for peers and orderers, network endpoints, deployment
//! modes, node lifecycle states and naming helpers.
//!
//! Descriptors are owned by the lifecycle controller and persisted by
//! outer services as JSON; everything here round-trips through serde
//! without field loss.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod descriptor;
mod endpoint;
mod error;
mod state;

pub use descriptor::{
    slug, AddressOverride, DeployMode, DescriptorBase, IdentityRef, NodeDescriptor, NodeKind,
    OrdererDescriptor, PeerDescriptor,
};
pub use endpoint::Endpoint;
pub use error::TypesError;
pub use state::NodeState;

/// Result type for type-level parsing and validation
pub type TypesResult<T> = Result<T, TypesError>;
