// Error taxonomy for the service manager
//
// Every failure carries a kind, a readable message and an optional cause.
// Callers should match on `kind()` instead of the message text.

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinError;

use crate::lifecycle::State;

/// Shared causing error, kept behind an `Arc` so `ServiceError` stays `Clone`
pub type Cause = Arc<dyn StdError + Send + Sync + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A service was registered after the manager left `New`
    Register,
    /// An illegal state machine move was requested
    Transition,
    /// A lifecycle hook did not settle within its budget
    Timeout,
    /// A lifecycle hook returned an error or panicked
    Hook,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Register => "RegisterError",
            ErrorKind::Transition => "TransitionError",
            ErrorKind::Timeout => "TimeoutError",
            ErrorKind::Hook => "HookError",
        };
        f.write_str(name)
    }
}

/// Chain of a hook error below its top-level message
#[derive(Debug)]
struct HookChain(anyhow::Error);

impl fmt::Display for HookChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.chain().nth(1) {
            Some(next) => fmt::Display::fmt(next, f),
            None => Ok(()),
        }
    }
}

impl StdError for HookChain {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.chain().nth(2)
    }
}

#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("{message}")]
    Register {
        message: String,
        #[source]
        cause: Option<Cause>,
    },
    #[error("Invalid transition from {from} to {to}")]
    Transition { from: State, to: State },
    #[error("Operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("{message}")]
    Hook {
        message: String,
        #[source]
        cause: Option<Cause>,
    },
}

impl ServiceError {
    pub fn register(message: impl Into<String>) -> Self {
        ServiceError::Register {
            message: message.into(),
            cause: None,
        }
    }

    pub fn transition(from: State, to: State) -> Self {
        ServiceError::Transition { from, to }
    }

    pub fn timeout(timeout_ms: u64) -> Self {
        ServiceError::Timeout { timeout_ms }
    }

    /// Wrap an error returned by a lifecycle hook.
    ///
    /// The hook's top-level message becomes the message; the rest of its
    /// chain (e.g. errors under `.context(..)`) is reachable through `source()`.
    pub fn hook(err: anyhow::Error) -> Self {
        let message = err.to_string();
        let has_chain = err.chain().nth(1).is_some();
        let cause = has_chain.then(|| Arc::new(HookChain(err)) as Cause);
        ServiceError::Hook { message, cause }
    }

    /// Convert a failed hook task into a hook error.
    /// Panics carry their payload message when it is a string.
    pub fn from_join(err: JoinError) -> Self {
        if err.is_panic() {
            let payload = err.into_panic();
            let detail = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic payload".to_string());
            ServiceError::Hook {
                message: format!("Service hook panicked: {detail}"),
                cause: None,
            }
        } else {
            let message = format!("Service hook was cancelled: {err}");
            ServiceError::Hook {
                message,
                cause: Some(Arc::new(err)),
            }
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Register { .. } => ErrorKind::Register,
            ServiceError::Transition { .. } => ErrorKind::Transition,
            ServiceError::Timeout { .. } => ErrorKind::Timeout,
            ServiceError::Hook { .. } => ErrorKind::Hook,
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn is_timeout(&self) -> bool {
        self.kind() == ErrorKind::Timeout
    }
}
