//! Redis client.
//!
//! Backs the auth rate limiter and the distributed per-resource locks used
//! when more than one server process shares a database.

use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use uuid::Uuid;

use crate::config::{
    Config, CACHE_PREFIX_LOCK, CACHE_PREFIX_RATE_LIMIT, DEFAULT_LOCK_RETRIES,
    DEFAULT_LOCK_RETRY_DELAY_MS, DEFAULT_LOCK_TTL_SECONDS,
};
use crate::errors::{AppError, AppResult};

/// Delete the key only while it still holds our token.
const RELEASE_SCRIPT: &str = r#"
    if redis.call("GET", KEYS[1]) == ARGV[1] then
        return redis.call("DEL", KEYS[1])
    else
        return 0
    end
"#;

/// Redis connection wrapper.
#[derive(Clone)]
pub struct Cache {
    connection: ConnectionManager,
}

impl Cache {
    /// Connect to Redis, returning an error instead of panicking.
    pub async fn try_connect(config: &Config) -> Result<Self, RedisError> {
        let client = Client::open(config.redis_url.as_str())?;
        let connection = ConnectionManager::new(client).await?;
        tracing::info!("Redis connected");
        Ok(Self { connection })
    }

    /// Round-trip a PING.
    pub async fn ping(&self) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(cache_error)?;
        Ok(())
    }

    // =========================================================================
    // Rate Limiting
    // =========================================================================

    /// Count one request against a fixed window.
    /// Returns (current_count, is_allowed).
    pub async fn check_rate_limit(
        &self,
        identifier: &str,
        max_requests: u64,
        window_seconds: u64,
    ) -> AppResult<(u64, bool)> {
        let key = format!("{}{}", CACHE_PREFIX_RATE_LIMIT, identifier);
        let mut conn = self.connection.clone();

        let count: u64 = conn.incr(&key, 1u64).await.map_err(cache_error)?;
        if count == 1 {
            // First hit opens the window
            let _: bool = conn
                .expire(&key, window_seconds as i64)
                .await
                .map_err(cache_error)?;
        }

        Ok((count, count <= max_requests))
    }

    // =========================================================================
    // Distributed Locks
    // =========================================================================

    /// Acquire `resource`, retrying while another holder has it.
    /// The returned guard releases the lock when dropped.
    pub async fn acquire_lock(&self, resource: &str) -> AppResult<LockGuard> {
        let key = format!("{}{}", CACHE_PREFIX_LOCK, resource);
        let lock_id = Uuid::new_v4().to_string();
        let mut conn = self.connection.clone();

        for attempt in 0..=DEFAULT_LOCK_RETRIES {
            // SET NX EX: only one holder, and a crashed holder expires
            let acquired: Option<String> = redis::cmd("SET")
                .arg(&key)
                .arg(&lock_id)
                .arg("NX")
                .arg("EX")
                .arg(DEFAULT_LOCK_TTL_SECONDS)
                .query_async(&mut conn)
                .await
                .map_err(cache_error)?;

            if acquired.is_some() {
                tracing::debug!(resource = %resource, attempt, "Lock acquired");
                return Ok(LockGuard {
                    cache: Arc::new(self.clone()),
                    key,
                    lock_id,
                });
            }

            if attempt < DEFAULT_LOCK_RETRIES {
                sleep(Duration::from_millis(DEFAULT_LOCK_RETRY_DELAY_MS)).await;
            }
        }

        tracing::warn!(resource = %resource, "Failed to acquire lock after retries");
        Err(AppError::ServiceUnavailable(format!(
            "lock for {} is busy",
            resource
        )))
    }

    async fn release_lock(&self, key: &str, lock_id: &str) -> AppResult<bool> {
        let mut conn = self.connection.clone();
        let released: i32 = redis::cmd("EVAL")
            .arg(RELEASE_SCRIPT)
            .arg(1)
            .arg(key)
            .arg(lock_id)
            .query_async(&mut conn)
            .await
            .map_err(cache_error)?;

        Ok(released == 1)
    }
}

// =============================================================================
// Lock Guard (RAII)
// =============================================================================

/// Held distributed lock. Released on drop.
pub struct LockGuard {
    cache: Arc<Cache>,
    key: String,
    lock_id: String,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let cache = self.cache.clone();
        let key = std::mem::take(&mut self.key);
        let lock_id = std::mem::take(&mut self.lock_id);

        tokio::spawn(async move {
            match cache.release_lock(&key, &lock_id).await {
                Ok(true) => tracing::debug!(key = %key, "Lock released"),
                Ok(false) => tracing::warn!(key = %key, "Lock expired before release"),
                Err(e) => tracing::error!(key = %key, error = %e, "Failed to release lock on drop"),
            }
        });
    }
}

/// Convert Redis error to AppError.
fn cache_error(e: RedisError) -> AppError {
    tracing::error!("Redis error: {}", e);
    AppError::internal(format!("Cache error: {}", e))
}
