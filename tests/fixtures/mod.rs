//! Test services with scripted delays and failures for lifecycle testing
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use service_manager::{ErrorKind, Service, ServiceManager, ServiceWrapper, State};
use std::time::Duration;

/// Per-phase delay in milliseconds
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceWaits {
    pub start: u64,
    pub stop: u64,
    pub destroy: u64,
}

/// Per-phase error message; `None` means the hook succeeds
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceErrors {
    pub start: Option<&'static str>,
    pub stop: Option<&'static str>,
    pub destroy: Option<&'static str>,
}

/// Service whose hooks sleep before settling
pub struct AsyncService {
    waits: ServiceWaits,
    errors: ServiceErrors,
}

/// Service whose hooks settle without awaiting anything
pub struct SyncService {
    errors: ServiceErrors,
}

pub fn create_async_service(waits: ServiceWaits, errors: ServiceErrors) -> AsyncService {
    AsyncService { waits, errors }
}

pub fn create_sync_service(errors: ServiceErrors) -> SyncService {
    SyncService { errors }
}

fn settle(phase: &str, error: Option<&'static str>, service: &ServiceWrapper<String>) -> Result<String> {
    match error {
        Some(message) => Err(anyhow!(message)),
        None => Ok(format!("{phase} {}", service.name())),
    }
}

async fn wait(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[async_trait]
impl Service<String> for AsyncService {
    async fn start(&self, service: &ServiceWrapper<String>) -> Result<String> {
        wait(self.waits.start).await;
        settle("start", self.errors.start, service)
    }

    async fn stop(&self, service: &ServiceWrapper<String>) -> Result<String> {
        wait(self.waits.stop).await;
        settle("stop", self.errors.stop, service)
    }

    async fn destroy(&self, service: &ServiceWrapper<String>) -> Result<String> {
        wait(self.waits.destroy).await;
        settle("destroy", self.errors.destroy, service)
    }
}

#[async_trait]
impl Service<String> for SyncService {
    async fn start(&self, service: &ServiceWrapper<String>) -> Result<String> {
        settle("start", self.errors.start, service)
    }

    async fn stop(&self, service: &ServiceWrapper<String>) -> Result<String> {
        settle("stop", self.errors.stop, service)
    }

    async fn destroy(&self, service: &ServiceWrapper<String>) -> Result<String> {
        settle("destroy", self.errors.destroy, service)
    }
}

/// Same delay for every phase
pub fn waits(ms: u64) -> ServiceWaits {
    ServiceWaits {
        start: ms,
        stop: ms,
        destroy: ms,
    }
}

pub fn states_of(manager: &ServiceManager<String>) -> Vec<State> {
    manager.services().iter().map(|s| s.state()).collect()
}

/// Results flattened to the success value or the error kind and message
pub fn results_of(manager: &ServiceManager<String>) -> Vec<Option<Result<String, (ErrorKind, String)>>> {
    manager
        .services()
        .iter()
        .map(|s| {
            s.result().map(|result| {
                result
                    .into_result()
                    .map_err(|err| (err.kind(), err.to_string()))
            })
        })
        .collect()
}

pub fn ok(value: &str) -> Option<Result<String, (ErrorKind, String)>> {
    Some(Ok(value.to_string()))
}

pub fn failed(kind: ErrorKind, message: &str) -> Option<Result<String, (ErrorKind, String)>> {
    Some(Err((kind, message.to_string())))
}
