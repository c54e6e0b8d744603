//! Redis cache adapter.
//!
//! Implements the [`CacheStore`] port on a `bb8-redis` connection pool. Only
//! plain string values are stored; expiry is applied with `SET ... EX`.

use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::RedisConnectionManager;
use bb8_redis::bb8::{Pool, PooledConnection};
use bb8_redis::redis::AsyncCommands;
use serde_json::json;

use crate::domain::ports::{CacheStore, CacheStoreError};
use crate::logging::{AppLogger, fields};

/// Pooled Redis client shared by every request.
#[derive(Clone)]
pub struct RedisCacheStore {
    pool: Pool<RedisConnectionManager>,
}

/// `url` with any password replaced, for logging.
fn redacted(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme), Some(at)) if at > scheme => {
            format!("{}://***{}", &url[..scheme], &url[at..])
        }
        _ => url.to_owned(),
    }
}

/// Whole seconds for `SET ... EX`; Redis rejects an expiry of zero.
fn expiry_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

impl RedisCacheStore {
    /// Build the pool for `url` (`redis://[:password@]host:port/db`).
    ///
    /// # Errors
    /// Returns [`CacheStoreError::Backend`] when the URL is invalid or the
    /// pool cannot be built.
    pub async fn connect(url: &str, logger: &AppLogger) -> Result<Self, CacheStoreError> {
        let logger = logger.for_context("Cache");
        let manager = RedisConnectionManager::new(url)
            .map_err(|error| CacheStoreError::backend(error.to_string()))?;
        let pool = Pool::builder()
            .build(manager)
            .await
            .map_err(|error| CacheStoreError::backend(error.to_string()))?;
        logger.info("Cache client ready", fields([("url", json!(redacted(url)))]));
        Ok(Self { pool })
    }

    async fn connection(
        &self,
    ) -> Result<PooledConnection<'_, RedisConnectionManager>, CacheStoreError> {
        self.pool
            .get()
            .await
            .map_err(|error| CacheStoreError::backend(error.to_string()))
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheStoreError> {
        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(key, value, expiry_seconds(ttl))
            .await
            .map_err(|error| CacheStoreError::backend(error.to_string()))
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError> {
        let mut conn = self.connection().await?;
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(|error| CacheStoreError::backend(error.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), CacheStoreError> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(key)
            .await
            .map_err(|error| CacheStoreError::backend(error.to_string()))
    }
}
