//! # quay-lifecycle
//!
//! Node Lifecycle Controller: one controller per node, sequencing
//! identity issuance, material generation, process supervision and
//! channel participation.
//!
//! Controllers own their node's deployment descriptor and run every
//! operation as a sequential series of steps; callers serialize
//! operations on the same node (one controller instance, one logical
//! owner at a time). All collaborators (identity provider, registry,
//! binary resolver, command runner, audit sink) are explicit
//! constructor dependencies; there is no process-wide singleton.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod audit;
mod controller;
mod error;
mod plan;
mod resolver;

pub use audit::{AuditEvent, AuditOutcome, AuditSink, RecordingAudit, TracingAudit};
pub use controller::NodeController;
pub use error::LifecycleError;
pub use plan::{build_launch_plan, default_image};
pub use resolver::{BinaryResolver, DirBinaryResolver};

/// Result type for lifecycle operations
pub type LifecycleResult<T> = Result<T, LifecycleError>;
