//! Audit sink

use parking_lot::Mutex;
use tracing::{info, warn};

/// Outcome recorded for an audited operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    /// The operation completed
    Success,
    /// The operation failed
    Failure,
}

/// One audited controller operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Node slug
    pub node: String,
    /// Operation name ("init", "start", "renew-certificates", ...)
    pub operation: String,
    /// How it ended
    pub outcome: AuditOutcome,
    /// Failure message, or renewed-certificate fingerprints on a
    /// successful renewal
    pub detail: Option<String>,
}

/// Destination for audit events.
///
/// Passed explicitly into every controller; there is no module-level
/// audit singleton.
pub trait AuditSink: Send + Sync {
    /// Record one event
    fn record(&self, event: AuditEvent);
}

/// Audit sink that emits structured tracing events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAudit;

impl AuditSink for TracingAudit {
    fn record(&self, event: AuditEvent) {
        match event.outcome {
            AuditOutcome::Success => {
                info!(node = event.node, operation = event.operation, "audit");
            }
            AuditOutcome::Failure => {
                warn!(
                    node = event.node,
                    operation = event.operation,
                    detail = event.detail.as_deref().unwrap_or(""),
                    "audit"
                );
            }
        }
    }
}

/// Audit sink that stores events in memory for assertions
#[derive(Default)]
pub struct RecordingAudit {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingAudit {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded so far
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().clone()
    }
}

impl AuditSink for RecordingAudit {
    fn record(&self, event: AuditEvent) {
        self.events.lock().push(event);
    }
}
