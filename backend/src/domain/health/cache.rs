//! Cache round-trip indicator.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::constants::cache;
use super::{HealthCheckResult, HealthIndicator};
use crate::domain::ports::CacheStore;
use crate::logging::{AppLogger, fields};

/// Writes a sentinel, reads it back, deletes it and compares.
///
/// Each failing step yields its own message so the report tells a broken
/// write apart from a broken read, a broken delete or a value mismatch. A
/// mismatch wins over a delete failure because it means the cache returned
/// wrong data.
#[derive(Clone)]
pub struct CacheHealthIndicator {
    cache: Arc<dyn CacheStore>,
    logger: AppLogger,
}

impl CacheHealthIndicator {
    pub fn new(cache: Arc<dyn CacheStore>, logger: &AppLogger) -> Self {
        Self {
            cache,
            logger: logger.for_context("CacheHealthIndicator"),
        }
    }

    async fn round_trip(&self) -> Result<(), String> {
        self.cache
            .set(cache::TEST_KEY, cache::TEST_VALUE, cache::TTL)
            .await
            .map_err(|error| format!("Cache write failed: {error}"))?;

        let retrieved = self
            .cache
            .get(cache::TEST_KEY)
            .await
            .map_err(|error| format!("Cache read failed: {error}"))?;

        let deleted = self.cache.delete(cache::TEST_KEY).await;

        if retrieved.as_deref() != Some(cache::TEST_VALUE) {
            return Err(cache::VERIFICATION_FAILED.to_owned());
        }
        deleted.map_err(|error| format!("Cache delete failed: {error}"))
    }
}

#[async_trait]
impl HealthIndicator for CacheHealthIndicator {
    async fn is_healthy(&self, key: &str) -> HealthCheckResult {
        match self.round_trip().await {
            Ok(()) => HealthCheckResult::up(key, cache::HEALTHY),
            Err(message) => {
                self.logger.error(
                    format!("{}: {message}", cache::FAILED),
                    fields([("error", json!(message))]),
                );
                HealthCheckResult::down(key, message)
            }
        }
    }
}
