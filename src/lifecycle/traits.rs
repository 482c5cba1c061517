// Lifecycle hooks implemented by managed services

use anyhow::Result;
use async_trait::async_trait;

use super::types::Phase;
use super::wrapper::ServiceWrapper;

/// A service driven through start, stop and destroy by the manager.
///
/// Each hook receives the wrapper it is registered under, so it can read its
/// own name and state. Hooks that have nothing to await simply return; both
/// kinds are settled the same way. Returning an error or panicking marks the
/// phase as failed.
#[async_trait]
pub trait Service<T>: Send + Sync {
    async fn start(&self, service: &ServiceWrapper<T>) -> Result<T>;

    async fn stop(&self, service: &ServiceWrapper<T>) -> Result<T>;

    async fn destroy(&self, service: &ServiceWrapper<T>) -> Result<T>;
}

impl Phase {
    /// Call the hook matching this phase
    pub(crate) async fn invoke<T>(
        self,
        hooks: &dyn Service<T>,
        service: &ServiceWrapper<T>,
    ) -> Result<T> {
        match self {
            Phase::Start => hooks.start(service).await,
            Phase::Stop => hooks.stop(service).await,
            Phase::Destroy => hooks.destroy(service).await,
        }
    }
}
