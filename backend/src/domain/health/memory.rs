//! Process memory indicator.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::constants::memory;
use super::{HealthCheckResult, HealthIndicator};
use crate::domain::ports::MemoryUsageProbe;
use crate::logging::{AppLogger, Fields, fields};

/// Down when resident memory is above the configured ceiling.
#[derive(Clone)]
pub struct MemoryHealthIndicator {
    probe: Arc<dyn MemoryUsageProbe>,
    threshold_bytes: u64,
    logger: AppLogger,
}

impl MemoryHealthIndicator {
    pub fn new(probe: Arc<dyn MemoryUsageProbe>, threshold_bytes: u64, logger: &AppLogger) -> Self {
        Self {
            probe,
            threshold_bytes,
            logger: logger.for_context("MemoryHealthIndicator"),
        }
    }
}

#[async_trait]
impl HealthIndicator for MemoryHealthIndicator {
    async fn is_healthy(&self, key: &str) -> HealthCheckResult {
        match self.probe.resident_bytes() {
            Ok(used) if used > self.threshold_bytes => {
                self.logger.warn(
                    memory::LOW_HEAP,
                    fields([
                        ("resident_bytes", json!(used)),
                        ("threshold_bytes", json!(self.threshold_bytes)),
                    ]),
                );
                HealthCheckResult::down(key, memory::LOW_HEAP)
            }
            Ok(_) => HealthCheckResult::up(key, memory::HEALTHY),
            Err(error) => {
                self.logger.error(
                    format!("Memory health check failed: {error}"),
                    Fields::new(),
                );
                HealthCheckResult::down(key, error.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockMemoryUsageProbe, SystemUsageError};
    use crate::logging::LogLevel;
    use crate::test_support::capturing_logger;
    use rstest::rstest;

    fn indicator(result: Result<u64, SystemUsageError>) -> MemoryHealthIndicator {
        let mut probe = MockMemoryUsageProbe::new();
        probe.expect_resident_bytes().returning(move || result.clone());
        let (logger, _) = capturing_logger(LogLevel::Debug);
        MemoryHealthIndicator::new(Arc::new(probe), 1024, &logger)
    }

    #[rstest]
    #[case(512, true)]
    #[case(1024, true)]
    #[case(1025, false)]
    #[tokio::test]
    async fn compares_resident_memory_with_threshold(#[case] used: u64, #[case] up: bool) {
        let result = indicator(Ok(used)).is_healthy(memory::KEY).await;
        assert_eq!(result.is_up(), up);
        assert_eq!(result.key(), "memory");
    }

    #[rstest]
    #[tokio::test]
    async fn unreadable_usage_is_down() {
        let result = indicator(Err(SystemUsageError::unavailable("no procfs")))
            .is_healthy(memory::KEY)
            .await;
        assert!(!result.is_up());
    }
}
