//! Bounded concurrent fan-out of independent remote calls
//!
//! Namespaces, variables, and function releases occupy disjoint key spaces,
//! so their remote calls can run concurrently. A semaphore caps how many are
//! in flight at once.

use crate::error::Result;
use futures::future::{join_all, try_join_all};
use std::future::Future;
use tokio::sync::Semaphore;

async fn guarded<F, T>(semaphore: &Semaphore, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let _permit = semaphore
        .acquire()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to acquire semaphore permit: {}", e))?;
    fut.await
}

/// Run every future with at most `limit` in flight, stopping at the first error
///
/// Futures still pending when one fails are dropped. Work that already
/// completed is not undone.
pub async fn try_join_bounded<I, F, T>(limit: usize, futures: I) -> Result<Vec<T>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T>>,
{
    let semaphore = Semaphore::new(limit.max(1));
    try_join_all(futures.into_iter().map(|fut| guarded(&semaphore, fut))).await
}

/// Run every future with at most `limit` in flight and keep each outcome
pub async fn join_bounded<I, F, T>(limit: usize, futures: I) -> Vec<Result<T>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T>>,
{
    let semaphore = Semaphore::new(limit.max(1));
    join_all(futures.into_iter().map(|fut| guarded(&semaphore, fut))).await
}
