//! Timeout race for lifecycle hooks.
//!
//! The operation and a timer run concurrently and the first to settle decides
//! the outcome. The losing side is dropped: a finished operation cancels the
//! timer, and a fired timer drops the operation future. Dropping a tokio
//! `JoinHandle` detaches its task instead of aborting it, so work handed over
//! as a spawned task keeps running and its late result is discarded.

use std::future::Future;
use std::time::Duration;

use crate::errors::ServiceError;

/// Race `operation` against `budget`. Exactly one outcome is produced.
pub async fn race<F, T>(operation: F, budget: Duration) -> Result<T, ServiceError>
where
    F: Future<Output = Result<T, ServiceError>>,
{
    match tokio::time::timeout(budget, operation).await {
        Ok(outcome) => outcome,
        Err(_elapsed) => Err(ServiceError::timeout(duration_ms(budget))),
    }
}

pub(crate) fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
