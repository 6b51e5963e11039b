use serde::{Deserialize, Serialize};
use std::fmt;

/// Poll scheduler state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MonitorPhase {
    /// Waiting for the next poll
    Idle,
    /// External status check in flight
    Polling,
    /// Diffing against the stored snapshot
    Comparing,
    /// Delivering notifications to subscribers
    Notifying,
    /// Writing the new snapshot to disk
    Persisting,
    /// Monitoring administratively disabled
    Stopped,
}

impl MonitorPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            MonitorPhase::Idle => "IDLE",
            MonitorPhase::Polling => "POLLING",
            MonitorPhase::Comparing => "COMPARING",
            MonitorPhase::Notifying => "NOTIFYING",
            MonitorPhase::Persisting => "PERSISTING",
            MonitorPhase::Stopped => "STOPPED",
        }
    }

    /// Check if this phase can transition to another phase
    pub fn can_transition_to(&self, target: MonitorPhase) -> bool {
        use MonitorPhase::*;

        match (self, target) {
            // From Idle
            (Idle, Polling) => true,
            (Idle, Stopped) => true,

            // From Polling
            (Polling, Comparing) => true, // Check succeeded
            (Polling, Polling) => true,   // Check failed, next platform
            (Polling, Idle) => true,      // Check failed, last platform

            // From Comparing
            (Comparing, Notifying) => true,  // Changes and subscribers
            (Comparing, Persisting) => true, // Nothing to send

            // From Notifying
            (Notifying, Persisting) => true,

            // From Persisting
            (Persisting, Polling) => true, // Next platform
            (Persisting, Idle) => true,    // Cycle complete

            // From Stopped
            (Stopped, Idle) => true, // Re-enabled

            _ => false,
        }
    }
}

impl fmt::Display for MonitorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        use MonitorPhase::*;

        assert!(Idle.can_transition_to(Polling));
        assert!(Idle.can_transition_to(Stopped));
        assert!(Polling.can_transition_to(Comparing));
        assert!(Polling.can_transition_to(Idle));
        assert!(Comparing.can_transition_to(Notifying));
        assert!(Comparing.can_transition_to(Persisting));
        assert!(Notifying.can_transition_to(Persisting));
        assert!(Persisting.can_transition_to(Idle));

        assert!(!Idle.can_transition_to(Notifying));
        assert!(!Notifying.can_transition_to(Idle));
        assert!(!Stopped.can_transition_to(Polling));
    }
}
