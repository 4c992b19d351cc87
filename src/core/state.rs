//! Publish loop state tracking.
//!
//! The loop alternates between exactly two states: `Idle` (between
//! cycles, sleeping) and `Publishing` (a request in flight). The runner
//! broadcasts transitions through a watch channel so diagnostics and
//! tests can observe where the loop is without instrumenting it. There is
//! no terminal state; the loop leaves `Idle`/`Publishing` only when the
//! process is told to stop.

use std::fmt;

/// Where the publish loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    /// Between cycles, sleeping out the fixed delay.
    Idle,

    /// A publish request is in flight.
    Publishing,
}

impl CycleState {
    /// Returns a short string identifier for the current state.
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleState::Idle => "Idle",
            CycleState::Publishing => "Publishing",
        }
    }

    /// True while a request is in flight.
    pub fn is_publishing(&self) -> bool {
        matches!(self, CycleState::Publishing)
    }
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_as_str() {
        assert_eq!(CycleState::Idle.as_str(), "Idle");
        assert_eq!(CycleState::Publishing.as_str(), "Publishing");
    }

    #[test]
    fn state_display() {
        assert_eq!(CycleState::Idle.to_string(), "Idle");
        assert_eq!(CycleState::Publishing.to_string(), "Publishing");
    }

    #[test]
    fn is_publishing() {
        assert!(CycleState::Publishing.is_publishing());
        assert!(!CycleState::Idle.is_publishing());
    }
}
