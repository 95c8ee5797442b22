//! # quay-supervise
//!
//! Deployment Process Supervisor: runs a node either as a host-managed
//! service (systemd or launchd dialect) or as a detached container, and
//! exposes the same start/stop/log-tail surface for both.
//!
//! All external process control goes through the [`CommandRunner`] seam
//! so strategies are testable without a service manager or container
//! runtime on the build host. Best-effort cleanup steps are routed
//! through [`best_effort`], which logs failures and continues; the
//! step that defines success is always the one whose error propagates.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod container;
mod error;
mod logs;
mod plan;
mod runner;
mod service;

pub use container::{ContainerSupervisor, CONTAINER_CONFIG_DIR, CONTAINER_DATA_DIR};
pub use error::SuperviseError;
pub use logs::{LogStream, LOG_BUFFER_LINES};
pub use plan::LaunchPlan;
pub use runner::{CommandOutput, CommandRunner, ExecRunner, MockRunner};
pub use service::{ServicePlatform, ServiceSupervisor};

use async_trait::async_trait;
use tracing::warn;

/// Result type for supervision operations
pub type SuperviseResult<T> = Result<T, SuperviseError>;

/// Uniform control surface over the two execution strategies.
///
/// One supervisor instance is bound to one node's launch plan; the
/// lifecycle controller selects the strategy from the deployment mode.
#[async_trait]
pub trait Supervisor: Send + Sync {
    /// Start (or restart) the node process
    async fn start(&self) -> SuperviseResult<()>;

    /// Stop the node process.
    ///
    /// Succeeds when the primary stop call succeeds; secondary cleanup
    /// failures are logged, not propagated.
    async fn stop(&self) -> SuperviseResult<()>;

    /// Stream log lines from the node's output sink.
    ///
    /// Infinite while `follow` is true, finite and restartable
    /// otherwise. Fails with [`SuperviseError::LogsUnavailable`] when no
    /// sink exists yet.
    async fn tail_logs(&self, tail: usize, follow: bool) -> SuperviseResult<LogStream>;
}

/// Run one best-effort cleanup step: log a failure at `warn` and keep
/// going. Returns the value on success so callers can still use it.
pub fn best_effort<T, E: std::fmt::Display>(operation: &str, result: Result<T, E>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(operation, error = %e, "best-effort cleanup step failed, continuing");
            None
        }
    }
}
