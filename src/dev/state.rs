//! Dev session state machine
//!
//! Initializing → PortNegotiation → Starting → Serving ⇄ Recompiling → Terminated

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevState {
    /// Composing configuration and reading server overrides
    Initializing,
    /// Probing for a free port
    PortNegotiation,
    /// Building server options and starting the server
    Starting,
    /// Serving the last good output
    Serving,
    /// A watched file changed; compile in flight
    Recompiling,
    /// Session over
    Terminated,
}

impl DevState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DevState::Terminated)
    }

    /// Check if transition from this state to target is valid
    pub fn can_transition_to(&self, target: DevState) -> bool {
        use DevState::*;
        match (self, target) {
            (Initializing, PortNegotiation) => true,
            (PortNegotiation, Starting) => true,

            // First compile completes while starting.
            (Starting, Serving) => true,
            (Starting, Recompiling) => true,

            (Serving, Recompiling) => true,
            (Recompiling, Serving) => true,

            // Any live state can end.
            (Terminated, _) => false,
            (_, Terminated) => true,

            _ => false,
        }
    }
}

/// Errors for dev state operations
#[derive(Debug, thiserror::Error)]
pub enum DevStateError {
    #[error("invalid dev session transition from {from:?} to {to:?}")]
    InvalidTransition { from: DevState, to: DevState },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let path = [
            DevState::Initializing,
            DevState::PortNegotiation,
            DevState::Starting,
            DevState::Serving,
            DevState::Recompiling,
            DevState::Serving,
            DevState::Terminated,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{:?} -> {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_terminated_is_final() {
        assert!(DevState::Terminated.is_terminal());
        assert!(!DevState::Terminated.can_transition_to(DevState::Serving));
        assert!(!DevState::Terminated.can_transition_to(DevState::Terminated));
    }

    #[test]
    fn test_cannot_skip_negotiation() {
        assert!(!DevState::Initializing.can_transition_to(DevState::Starting));
        assert!(!DevState::Initializing.can_transition_to(DevState::Serving));
        assert!(!DevState::Serving.can_transition_to(DevState::Starting));
    }

    #[test]
    fn test_start_failure_terminates() {
        assert!(DevState::Starting.can_transition_to(DevState::Terminated));
        assert!(DevState::PortNegotiation.can_transition_to(DevState::Terminated));
    }
}
