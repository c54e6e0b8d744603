//! Data store liveness indicator.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::constants::database;
use super::{HealthCheckResult, HealthIndicator};
use crate::domain::ports::DataStore;
use crate::logging::{AppLogger, fields};

/// Issues a trivial round-trip query; success means up.
#[derive(Clone)]
pub struct DataStoreHealthIndicator {
    store: Arc<dyn DataStore>,
    logger: AppLogger,
}

impl DataStoreHealthIndicator {
    pub fn new(store: Arc<dyn DataStore>, logger: &AppLogger) -> Self {
        Self {
            store,
            logger: logger.for_context("DataStoreHealthIndicator"),
        }
    }
}

#[async_trait]
impl HealthIndicator for DataStoreHealthIndicator {
    async fn is_healthy(&self, key: &str) -> HealthCheckResult {
        match self.store.ping().await {
            Ok(()) => HealthCheckResult::up(key, database::HEALTHY),
            Err(error) => {
                let message = error.to_string();
                self.logger.error(
                    format!("Database health check failed: {message}"),
                    fields([("error", json!(message))]),
                );
                let message = if message.is_empty() {
                    database::FAILED.to_owned()
                } else {
                    message
                };
                HealthCheckResult::down(key, message)
            }
        }
    }
}
