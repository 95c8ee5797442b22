//! Derived node lifecycle state

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a node as observed by its controller.
///
/// Derived, never persisted: controllers recompute it from the effects
/// of their own operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeState {
    /// No identities issued, no on-disk material
    Uninitialized,
    /// Identities issued and material written, never started
    Initialized,
    /// Process or container is up
    Running,
    /// Stop in progress
    Stopping,
    /// Cleanly stopped, material preserved
    Stopped,
    /// An unrecoverable failure occurred during a transition
    Error,
}

impl NodeState {
    /// Whether the state machine permits a transition from `self` to `to`.
    ///
    /// Any state may transition to `Error`. `Running -> Running` is the
    /// certificate-renewal restart.
    pub fn can_transition(self, to: NodeState) -> bool {
        use NodeState::*;
        match (self, to) {
            (_, Error) => true,
            (Uninitialized, Initialized) => true,
            (Initialized | Stopped, Running) => true,
            (Running, Stopping) | (Running, Stopped) | (Stopping, Stopped) => true,
            (Running, Running) => true,
            _ => false,
        }
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uninitialized => "uninitialized",
            Self::Initialized => "initialized",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Error => "error",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use NodeState::*;

    #[test]
    fn test_transition_table() {
        assert!(Uninitialized.can_transition(Initialized));
        assert!(Initialized.can_transition(Running));
        assert!(Stopped.can_transition(Running));
        assert!(Running.can_transition(Stopped));
        assert!(Running.can_transition(Running));
        assert!(Stopping.can_transition(Stopped));
        assert!(Stopped.can_transition(Error));

        assert!(!Uninitialized.can_transition(Running));
        assert!(!Stopped.can_transition(Initialized));
        assert!(!Error.can_transition(Running));
    }
}
