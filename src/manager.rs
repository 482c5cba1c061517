// Service Manager - drives a batch of services through their lifecycle
//
// Every phase fans out to all registered services concurrently and waits for
// all of them, whatever their individual outcome. The manager's own state is
// a coarse health signal; per-service results stay on the wrappers.

use futures::future::join_all;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{info, warn, Instrument};

use crate::config::ServiceManagerOptions;
use crate::errors::ServiceError;
use crate::lifecycle::{Phase, Service, ServiceStatus, ServiceWrapper, State, StateMachine};
use crate::observability::PhaseTimer;
use crate::telemetry::{create_phase_span, generate_correlation_id};

struct ManagerState<T> {
    machine: StateMachine,
    services: Vec<Arc<ServiceWrapper<T>>>,
}

/// A state manager for services
pub struct ServiceManager<T> {
    inner: Mutex<ManagerState<T>>,
    timeout: Duration,
}

impl<T> Default for ServiceManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ServiceManager<T> {
    /// Create a manager with the default 30 second phase timeout
    pub fn new() -> Self {
        Self::with_options(ServiceManagerOptions::default())
    }

    pub fn with_options(options: ServiceManagerOptions) -> Self {
        Self {
            inner: Mutex::new(ManagerState {
                machine: StateMachine::new(),
                services: Vec::new(),
            }),
            timeout: options.timeout(),
        }
    }

    pub fn state(&self) -> State {
        self.lock().machine.state()
    }

    pub fn previous_state(&self) -> State {
        self.lock().machine.previous_state()
    }

    /// Budget given to every hook call
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Registered services in registration order
    pub fn services(&self) -> Vec<Arc<ServiceWrapper<T>>> {
        self.lock().services.clone()
    }

    pub fn status_report(&self) -> Vec<ServiceStatus> {
        self.services().iter().map(|service| service.status()).collect()
    }

    /// Register a service. Only allowed while the manager is still `New`.
    ///
    /// Names are labels for the status listing; duplicates are accepted.
    pub fn register_service<S>(&self, name: impl Into<String>, service: S) -> Result<(), ServiceError>
    where
        S: Service<T> + 'static,
    {
        let name = name.into();
        let mut inner = self.lock();
        if inner.machine.state() != State::New {
            warn!(service = %name, state = %inner.machine.state(), "Rejected late service registration");
            return Err(ServiceError::register(
                "Attempt to register a service after manager has started",
            ));
        }

        if inner.services.iter().any(|existing| existing.name() == name) {
            warn!(service = %name, "Registering a service under a duplicate name");
        }

        inner
            .services
            .push(Arc::new(ServiceWrapper::new(name.clone(), Arc::new(service))));
        info!(service = %name, "Service registered");
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, ManagerState<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, phase: Phase) -> Result<Vec<Arc<ServiceWrapper<T>>>, ServiceError> {
        let mut inner = self.lock();
        inner.machine.transition(phase.in_progress())?;
        Ok(inner.services.clone())
    }

    fn finish(
        &self,
        phase: Phase,
        timer: PhaseTimer,
        services: &[Arc<ServiceWrapper<T>>],
        outcomes: Vec<Result<(), ServiceError>>,
    ) -> Result<(), ServiceError> {
        let misuse = outcomes.into_iter().find_map(Result::err);
        let failed: Vec<&str> = services
            .iter()
            .filter(|service| service.error().is_some())
            .map(|service| service.name())
            .collect();
        let any_error = services.iter().any(|service| service.state() == State::Error);

        // Destroying can only lead to Destroyed
        let target = match phase {
            Phase::Destroy => State::Destroyed,
            Phase::Start | Phase::Stop if any_error || misuse.is_some() => State::Error,
            Phase::Start | Phase::Stop => phase.completed(),
        };
        self.lock().machine.transition(target)?;
        timer.finish(target, &failed);

        match misuse {
            Some(err) => {
                warn!(phase = %phase, error = %err, "Service was driven out of sequence");
                Err(err)
            }
            None => Ok(()),
        }
    }
}

impl<T: Send + 'static> ServiceManager<T> {
    /// Start the registered services.
    ///
    /// Fails with a transition error, before any service runs, when the
    /// manager cannot move to `Starting`.
    pub fn start(&self) -> impl Future<Output = Result<(), ServiceError>> + Send + '_ {
        self.run_phase(Phase::Start)
    }

    /// Stop the registered services
    pub fn stop(&self) -> impl Future<Output = Result<(), ServiceError>> + Send + '_ {
        self.run_phase(Phase::Stop)
    }

    /// Destroy the registered services. The manager always ends `Destroyed`.
    pub fn destroy(&self) -> impl Future<Output = Result<(), ServiceError>> + Send + '_ {
        self.run_phase(Phase::Destroy)
    }

    // The manager and every service enter the in-progress state here, when the
    // phase is requested, so a concurrent caller never sees a stale state.
    fn run_phase(&self, phase: Phase) -> impl Future<Output = Result<(), ServiceError>> + Send + '_ {
        let correlation_id = generate_correlation_id();
        let span = create_phase_span(phase, self.lock().services.len(), &correlation_id);

        let begun = {
            let _entered = span.enter();
            self.begin(phase).map(|services| {
                let units: Vec<_> = services
                    .iter()
                    .map(|service| service.run_phase(phase, self.timeout))
                    .collect();
                (services, units, PhaseGuard::new(self, phase))
            })
        };

        async move {
            let (services, units, guard) = begun?;
            let timer = PhaseTimer::new(phase);
            let outcomes = join_all(units).await;
            guard.disarm();
            self.finish(phase, timer, &services, outcomes)
        }
        .instrument(span)
    }
}

/// Leaves the manager in the phase's failure state when a phase future is
/// dropped before it finishes. Services settle on their own tasks.
struct PhaseGuard<'a, T> {
    manager: &'a ServiceManager<T>,
    phase: Phase,
    armed: bool,
}

impl<'a, T> PhaseGuard<'a, T> {
    fn new(manager: &'a ServiceManager<T>, phase: Phase) -> Self {
        Self {
            manager,
            phase,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<T> Drop for PhaseGuard<'_, T> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let target = self.phase.failed();
        warn!(phase = %self.phase, state = %target, "Phase abandoned before completion");
        // Rejection is already logged by the state machine
        let _ = self.manager.lock().machine.transition(target);
    }
}

impl<T> fmt::Debug for ServiceManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("ServiceManager")
            .field("state", &inner.machine.state())
            .field("previous_state", &inner.machine.previous_state())
            .field("services", &inner.services)
            .field("timeout", &self.timeout)
            .finish()
    }
}
