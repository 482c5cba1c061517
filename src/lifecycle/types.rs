// Core types for the service lifecycle

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ServiceError;

/// Lifecycle state shared by the manager and every wrapped service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    New,
    Starting,
    Started,
    Stopping,
    Stopped,
    Destroying,
    Destroyed,
    Error,
}

impl State {
    pub const ALL: [State; 8] = [
        State::New,
        State::Starting,
        State::Started,
        State::Stopping,
        State::Stopped,
        State::Destroying,
        State::Destroyed,
        State::Error,
    ];

    /// Printable name of the state
    pub fn name(self) -> &'static str {
        match self {
            State::New => "new",
            State::Starting => "starting",
            State::Started => "started",
            State::Stopping => "stopping",
            State::Stopped => "stopped",
            State::Destroying => "destroying",
            State::Destroyed => "destroyed",
            State::Error => "error",
        }
    }

    /// States only held while a phase is running
    pub fn is_transient(self) -> bool {
        matches!(self, State::Starting | State::Stopping | State::Destroying)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One of the three lifecycle operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Start,
    Stop,
    Destroy,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Phase::Start => "start",
            Phase::Stop => "stop",
            Phase::Destroy => "destroy",
        }
    }

    /// State held while the phase runs
    pub fn in_progress(self) -> State {
        match self {
            Phase::Start => State::Starting,
            Phase::Stop => State::Stopping,
            Phase::Destroy => State::Destroying,
        }
    }

    /// State reached when the phase completes without error
    pub fn completed(self) -> State {
        match self {
            Phase::Start => State::Started,
            Phase::Stop => State::Stopped,
            Phase::Destroy => State::Destroyed,
        }
    }

    /// State reached when the phase fails. Destroy always completes structurally.
    pub fn failed(self) -> State {
        match self {
            Phase::Destroy => State::Destroyed,
            Phase::Start | Phase::Stop => State::Error,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of the most recently completed phase of a service
#[derive(Debug, Clone)]
pub enum ServiceResult<T> {
    Success(T),
    Failure(ServiceError),
}

impl<T> ServiceResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, ServiceResult::Success(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            ServiceResult::Success(value) => Some(value),
            ServiceResult::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ServiceError> {
        match self {
            ServiceResult::Success(_) => None,
            ServiceResult::Failure(err) => Some(err),
        }
    }

    pub fn into_result(self) -> Result<T, ServiceError> {
        match self {
            ServiceResult::Success(value) => Ok(value),
            ServiceResult::Failure(err) => Err(err),
        }
    }
}

impl<T> From<Result<T, ServiceError>> for ServiceResult<T> {
    fn from(result: Result<T, ServiceError>) -> Self {
        match result {
            Ok(value) => ServiceResult::Success(value),
            Err(err) => ServiceResult::Failure(err),
        }
    }
}
