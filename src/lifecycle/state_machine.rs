use tracing::{debug, warn};

use super::types::State;
use crate::errors::ServiceError;

impl State {
    /// Row of the transition table: every state reachable from `self`
    pub fn allowed_transitions(self) -> &'static [State] {
        match self {
            State::New => &[
                State::Starting,
                State::Stopping,
                State::Destroying,
                State::Error,
            ],
            State::Starting => &[State::Started, State::Error],
            State::Started => &[State::Stopping, State::Destroying, State::Error],
            State::Stopping => &[State::Stopped, State::Error],
            State::Stopped => &[State::Starting, State::Destroying, State::Error],
            State::Destroying => &[State::Destroyed],
            State::Destroyed => &[],
            State::Error => &[
                State::Starting,
                State::Stopping,
                State::Destroying,
                State::Error,
            ],
        }
    }

    pub fn can_transition_to(self, target: State) -> bool {
        self.allowed_transitions().contains(&target)
    }
}

/// Current and previous lifecycle state, changed only through `transition`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateMachine {
    state: State,
    previous_state: State,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: State::New,
            previous_state: State::New,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Last non-transient state held before the current one
    pub fn previous_state(&self) -> State {
        self.previous_state
    }

    /// Move to `target`, leaving the machine untouched if the table forbids it
    pub fn transition(&mut self, target: State) -> Result<(), ServiceError> {
        let from = self.state;
        if !from.can_transition_to(target) {
            warn!(from = %from, to = %target, "Rejected state transition");
            return Err(ServiceError::transition(from, target));
        }

        if !from.is_transient() {
            self.previous_state = from;
        }
        self.state = target;

        debug!(from = %from, to = %target, "State transition");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_starts_new() {
        let machine = StateMachine::new();
        assert_eq!(machine.state(), State::New);
        assert_eq!(machine.previous_state(), State::New);
    }

    #[test]
    fn test_full_lifecycle_tracks_previous_state() {
        let mut machine = StateMachine::new();

        machine.transition(State::Starting).unwrap();
        assert_eq!(machine.previous_state(), State::New);
        machine.transition(State::Started).unwrap();
        assert_eq!(machine.previous_state(), State::New);

        machine.transition(State::Stopping).unwrap();
        machine.transition(State::Stopped).unwrap();
        assert_eq!(machine.state(), State::Stopped);
        assert_eq!(machine.previous_state(), State::Started);

        machine.transition(State::Destroying).unwrap();
        machine.transition(State::Destroyed).unwrap();
        assert_eq!(machine.state(), State::Destroyed);
        assert_eq!(machine.previous_state(), State::Stopped);
    }

    #[test]
    fn test_rejected_transition_leaves_state_unchanged() {
        let mut machine = StateMachine::new();
        machine.transition(State::Starting).unwrap();

        let err = machine.transition(State::Stopping).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transition);
        assert_eq!(err.to_string(), "Invalid transition from starting to stopping");
        assert_eq!(machine.state(), State::Starting);
        assert_eq!(machine.previous_state(), State::New);
    }

    #[test]
    fn test_destroyed_is_terminal() {
        let mut machine = StateMachine::new();
        machine.transition(State::Destroying).unwrap();
        machine.transition(State::Destroyed).unwrap();

        for target in State::ALL {
            assert!(machine.transition(target).is_err(), "destroyed -> {target}");
        }
        assert_eq!(machine.state(), State::Destroyed);
    }

    #[test]
    fn test_destroying_cannot_fail_into_error() {
        assert!(!State::Destroying.can_transition_to(State::Error));
        assert!(State::Destroying.can_transition_to(State::Destroyed));
    }

    #[test]
    fn test_error_is_recoverable() {
        let mut machine = StateMachine::new();
        machine.transition(State::Starting).unwrap();
        machine.transition(State::Error).unwrap();
        machine.transition(State::Error).unwrap();
        assert_eq!(machine.previous_state(), State::Error);

        machine.transition(State::Starting).unwrap();
        machine.transition(State::Started).unwrap();
        assert_eq!(machine.previous_state(), State::Error);
    }

    #[test]
    fn test_second_start_without_stop_is_illegal() {
        let mut machine = StateMachine::new();
        machine.transition(State::Starting).unwrap();
        machine.transition(State::Started).unwrap();
        assert!(machine.transition(State::Starting).is_err());
        assert_eq!(machine.state(), State::Started);
    }

    #[test]
    fn test_state_names() {
        let names: Vec<&str> = State::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec![
                "new",
                "starting",
                "started",
                "stopping",
                "stopped",
                "destroying",
                "destroyed",
                "error"
            ]
        );
        assert_eq!(State::Destroying.to_string(), "destroying");
        assert_eq!(
            serde_json::to_string(&State::Stopped).unwrap(),
            "\"stopped\""
        );
    }
}
