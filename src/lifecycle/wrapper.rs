// Service wrapper - binds one service to its own state machine
//
// Phase calls never surface hook failures or timeouts as errors. Those are
// recorded as the wrapper's result so a whole batch of services can be drained
// even when some of them fail. Only an illegal transition (e.g. starting a
// service that is already starting) is returned to the caller.

use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn, Instrument};

use super::state_machine::StateMachine;
use super::timeout;
use super::traits::Service;
use super::types::{Phase, ServiceResult, State};
use crate::errors::{ErrorKind, ServiceError};

struct WrapperState<T> {
    machine: StateMachine,
    result: Option<ServiceResult<T>>,
}

pub struct ServiceWrapper<T> {
    name: String,
    hooks: Arc<dyn Service<T>>,
    inner: Mutex<WrapperState<T>>,
}

/// Serializable snapshot of a wrapped service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub name: String,
    pub state: State,
    pub previous_state: State,
    pub outcome: Option<OutcomeStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Succeeded,
    Failed { kind: ErrorKind, message: String },
}

impl<T> ServiceWrapper<T> {
    pub fn new(name: impl Into<String>, hooks: Arc<dyn Service<T>>) -> Self {
        Self {
            name: name.into(),
            hooks,
            inner: Mutex::new(WrapperState {
                machine: StateMachine::new(),
                result: None,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> State {
        self.lock().machine.state()
    }

    pub fn previous_state(&self) -> State {
        self.lock().machine.previous_state()
    }

    /// Result of the last completed phase; `None` while a phase is running
    pub fn result(&self) -> Option<ServiceResult<T>>
    where
        T: Clone,
    {
        self.lock().result.clone()
    }

    /// Error recorded by the last completed phase, if it failed
    pub fn error(&self) -> Option<ServiceError> {
        match &self.lock().result {
            Some(ServiceResult::Failure(err)) => Some(err.clone()),
            _ => None,
        }
    }

    pub fn status(&self) -> ServiceStatus {
        let inner = self.lock();
        let outcome = inner.result.as_ref().map(|result| match result {
            ServiceResult::Success(_) => OutcomeStatus::Succeeded,
            ServiceResult::Failure(err) => OutcomeStatus::Failed {
                kind: err.kind(),
                message: err.message(),
            },
        });
        ServiceStatus {
            name: self.name.clone(),
            state: inner.machine.state(),
            previous_state: inner.machine.previous_state(),
            outcome,
        }
    }

    // Guards are never held across an await, so a poisoned lock still holds
    // consistent data.
    fn lock(&self) -> MutexGuard<'_, WrapperState<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, phase: Phase) -> Result<(), ServiceError> {
        let mut inner = self.lock();
        inner.result = None;
        inner.machine.transition(phase.in_progress())
    }

    fn settle(&self, phase: Phase, outcome: Result<T, ServiceError>) -> Result<(), ServiceError> {
        let mut inner = self.lock();
        match &outcome {
            Ok(_) => {
                inner.machine.transition(phase.completed())?;
                info!(service = %self.name, phase = %phase, "Service phase completed");
            }
            Err(err) => {
                inner.machine.transition(phase.failed())?;
                warn!(
                    service = %self.name,
                    phase = %phase,
                    kind = %err.kind(),
                    error = %err,
                    "Service phase failed"
                );
            }
        }
        inner.result = Some(ServiceResult::from(outcome));
        Ok(())
    }
}

impl<T: Send + 'static> ServiceWrapper<T> {
    /// Start the service, giving the hook `timeout` to settle
    pub fn start(
        self: &Arc<Self>,
        timeout: Duration,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send + 'static {
        self.run_phase(Phase::Start, timeout)
    }

    /// Stop the service, giving the hook `timeout` to settle
    pub fn stop(
        self: &Arc<Self>,
        timeout: Duration,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send + 'static {
        self.run_phase(Phase::Stop, timeout)
    }

    /// Destroy the service. It ends `Destroyed` even when the hook fails.
    pub fn destroy(
        self: &Arc<Self>,
        timeout: Duration,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send + 'static {
        self.run_phase(Phase::Destroy, timeout)
    }

    /// Run one phase. The in-progress transition happens when this is called,
    /// before the returned future is polled.
    ///
    /// The hook is raced and the outcome settled on a spawned task, so the
    /// service reaches its final state even if the returned future is dropped.
    /// Must be called from within a tokio runtime.
    pub fn run_phase(
        self: &Arc<Self>,
        phase: Phase,
        timeout: Duration,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send + 'static {
        let task = self.begin(phase).map(|()| {
            let unit = Arc::clone(self);
            tokio::spawn(async move { unit.drive(phase, timeout).await }.in_current_span())
        });

        async move {
            match task?.await {
                Ok(settled) => settled,
                Err(join_err) => Err(ServiceError::from_join(join_err)),
            }
        }
    }

    async fn drive(self: Arc<Self>, phase: Phase, timeout: Duration) -> Result<(), ServiceError> {
        debug!(
            service = %self.name,
            phase = %phase,
            timeout_ms = timeout::duration_ms(timeout),
            "Invoking service hook"
        );

        let task_unit = Arc::clone(&self);
        let hook = tokio::spawn(
            async move { phase.invoke(&*task_unit.hooks, &task_unit).await }.in_current_span(),
        );

        let outcome = timeout::race(
            async move {
                match hook.await {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(err)) => Err(ServiceError::hook(err)),
                    Err(join_err) => Err(ServiceError::from_join(join_err)),
                }
            },
            timeout,
        )
        .await;

        self.settle(phase, outcome)
    }
}

impl<T> fmt::Debug for ServiceWrapper<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("ServiceWrapper")
            .field("name", &self.name)
            .field("state", &inner.machine.state())
            .field("previous_state", &inner.machine.previous_state())
            .field("has_result", &inner.result.is_some())
            .finish()
    }
}
