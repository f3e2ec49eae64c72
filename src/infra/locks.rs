//! Per-resource mutual exclusion.
//!
//! Cart read-modify-write sections run under `cart:{user_id}`. With Redis
//! configured the lock is shared by every server process; otherwise an
//! in-process async mutex per key is used.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::time::{timeout, Duration};
use uuid::Uuid;

use super::cache::{Cache, LockGuard};
use crate::config::{
    DEFAULT_LOCK_RETRIES, DEFAULT_LOCK_RETRY_DELAY_MS, LOCK_PREFIX_CART,
};
use crate::errors::{AppError, AppResult};

/// Lock resource name for a user's cart.
pub fn cart_resource(user_id: Uuid) -> String {
    format!("{}{}", LOCK_PREFIX_CART, user_id)
}

/// Held lock. The section ends when this is dropped.
pub enum ResourceGuard {
    Local(OwnedMutexGuard<()>),
    Distributed(LockGuard),
}

impl std::fmt::Debug for ResourceGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceGuard::Local(_) => f.write_str("ResourceGuard::Local"),
            ResourceGuard::Distributed(_) => f.write_str("ResourceGuard::Distributed"),
        }
    }
}

#[async_trait]
pub trait LockProvider: Send + Sync {
    /// Wait for exclusive access to `resource`.
    async fn acquire(&self, resource: &str) -> AppResult<ResourceGuard>;
}

#[async_trait]
impl LockProvider for Cache {
    async fn acquire(&self, resource: &str) -> AppResult<ResourceGuard> {
        self.acquire_lock(resource)
            .await
            .map(ResourceGuard::Distributed)
    }
}

/// In-process keyed mutexes for single-instance deployments.
#[derive(Default)]
pub struct LocalLocks {
    slots: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl LocalLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, resource: &str) -> AppResult<Arc<AsyncMutex<()>>> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| AppError::internal("lock table poisoned"))?;

        // Entries nobody holds or waits on can go
        slots.retain(|key, slot| key == resource || Arc::strong_count(slot) > 1);

        Ok(slots
            .entry(resource.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone())
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots.lock().map(|s| s.len()).unwrap_or_default()
    }
}

#[async_trait]
impl LockProvider for LocalLocks {
    async fn acquire(&self, resource: &str) -> AppResult<ResourceGuard> {
        let slot = self.slot(resource)?;
        let wait = Duration::from_millis(DEFAULT_LOCK_RETRIES as u64 * DEFAULT_LOCK_RETRY_DELAY_MS);

        match timeout(wait, slot.lock_owned()).await {
            Ok(guard) => {
                tracing::debug!(resource = %resource, "Local lock acquired");
                Ok(ResourceGuard::Local(guard))
            }
            Err(_) => {
                tracing::warn!(resource = %resource, "Timed out waiting for local lock");
                Err(AppError::ServiceUnavailable(format!(
                    "lock for {} is busy",
                    resource
                )))
            }
        }
    }
}
