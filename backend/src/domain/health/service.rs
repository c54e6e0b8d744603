//! Concurrent fan-out over the registered indicators.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use serde_json::json;

use super::{AggregateHealthReport, HealthCheckResult, HealthIndicator, aggregate};
use crate::domain::CorrelationContext;
use crate::logging::{AppLogger, fields};

/// Errors raised while registering indicators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HealthRegistrationError {
    /// Another indicator already reports under this key.
    #[error("health indicator key `{key}` is already registered")]
    DuplicateKey { key: String },
}

/// Runs every registered indicator concurrently and aggregates the verdicts.
///
/// Each indicator runs in its own task under a time limit. A timed-out or
/// panicking indicator is reported as down under its key, so the report
/// always covers every registered indicator.
pub struct HealthCheckService {
    indicators: Vec<(String, Arc<dyn HealthIndicator>)>,
    timeout: Duration,
    logger: AppLogger,
}

impl HealthCheckService {
    /// Service applying `timeout` to each indicator.
    pub fn new(timeout: Duration, logger: &AppLogger) -> Self {
        Self {
            indicators: Vec::new(),
            timeout,
            logger: logger.for_context("HealthCheck"),
        }
    }

    /// Register `indicator` under `key`.
    ///
    /// # Errors
    /// Returns [`HealthRegistrationError::DuplicateKey`] when `key` is taken.
    pub fn register(
        &mut self,
        key: impl Into<String>,
        indicator: Arc<dyn HealthIndicator>,
    ) -> Result<(), HealthRegistrationError> {
        let key = key.into();
        if self.indicators.iter().any(|(existing, _)| *existing == key) {
            return Err(HealthRegistrationError::DuplicateKey { key });
        }
        self.indicators.push((key, indicator));
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    ///
    /// # Errors
    /// Returns [`HealthRegistrationError::DuplicateKey`] when `key` is taken.
    pub fn with_indicator(
        mut self,
        key: impl Into<String>,
        indicator: Arc<dyn HealthIndicator>,
    ) -> Result<Self, HealthRegistrationError> {
        self.register(key, indicator)?;
        Ok(self)
    }

    /// Registered keys, in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.indicators.iter().map(|(key, _)| key.as_str())
    }

    /// Probe every dependency and build a fresh report.
    pub async fn check(&self) -> AggregateHealthReport {
        let limit = self.timeout;
        let tasks = self.indicators.iter().map(|(key, indicator)| {
            let task_key = key.clone();
            let indicator = Arc::clone(indicator);
            let handle = tokio::spawn(CorrelationContext::propagate(async move {
                match tokio::time::timeout(limit, indicator.is_healthy(&task_key)).await {
                    Ok(result) => result,
                    Err(_) => HealthCheckResult::down(
                        task_key,
                        format!("health check timed out after {}ms", limit.as_millis()),
                    ),
                }
            }));
            (key.clone(), handle)
        });
        let tasks: Vec<_> = tasks.collect();

        let results = join_all(tasks.into_iter().map(|(key, handle)| async move {
            match handle.await {
                Ok(result) => result.rekeyed(key),
                Err(error) => {
                    HealthCheckResult::down(key, format!("health indicator failed: {error}"))
                }
            }
        }))
        .await;

        for result in results.iter().filter(|result| !result.is_up()) {
            self.logger.debug(
                format!("Health indicator {} is down", result.key()),
                fields([("message", json!(result.message()))]),
            );
        }

        let report = aggregate(results);
        if !report.is_ok() {
            let failing: Vec<&str> = report.error().keys().map(String::as_str).collect();
            self.logger.warn(
                "Health check failed",
                fields([("failing", json!(failing))]),
            );
        }
        report
    }
}
