//! Lifecycle error taxonomy

use quay_channel::ChannelError;
use quay_identity::IdentityError;
use quay_material::MaterialError;
use quay_supervise::SuperviseError;
use quay_types::NodeKind;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by controller operations.
///
/// Every variant carries the node slug so operators can diagnose a
/// failure without re-deriving state from logs.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// CA or key operation failed
    #[error("identity operation failed for node {node}: {source}")]
    Identity {
        /// Node slug
        node: String,
        /// Underlying cause
        #[source]
        source: IdentityError,
    },
    /// Directory or file generation failed
    #[error("filesystem error for node {node}: {source}")]
    Filesystem {
        /// Node slug
        node: String,
        /// Underlying cause
        #[source]
        source: MaterialError,
    },
    /// No node binary is available for the requested version
    #[error("no {kind} binary for version {version} under {root}")]
    BinaryNotFound {
        /// Node kind
        kind: NodeKind,
        /// Requested version
        version: String,
        /// Binary cache root searched
        root: PathBuf,
    },
    /// Deployment mode is not one of the supported strategies
    #[error("unsupported deployment mode '{mode}' for node {node}")]
    UnsupportedMode {
        /// Node slug
        node: String,
        /// The offending mode string
        mode: String,
    },
    /// Service manager or container runtime failure
    #[error("process control failed for node {node}: {source}")]
    Process {
        /// Node slug
        node: String,
        /// Underlying cause
        #[source]
        source: SuperviseError,
    },
    /// Channel participation call failed
    #[error("participation call failed for node {node}: {source}")]
    Protocol {
        /// Node slug
        node: String,
        /// Underlying cause
        #[source]
        source: ChannelError,
    },
    /// A required descriptor field or precondition is missing
    #[error("configuration error for node {node}: {detail}")]
    Configuration {
        /// Node slug
        node: String,
        /// What is missing or inconsistent
        detail: String,
    },
    /// The node has no output sink yet (never started)
    #[error("no log sink exists for node {node}")]
    LogsUnavailable {
        /// Node slug
        node: String,
    },
}
