//! Disk capacity indicator.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::constants::disk;
use super::{HealthCheckResult, HealthIndicator};
use crate::domain::ports::StorageUsageProbe;
use crate::logging::{AppLogger, fields};

/// Down when used space on the filesystem holding `path` exceeds the
/// configured share of its capacity.
#[derive(Clone)]
pub struct DiskHealthIndicator {
    probe: Arc<dyn StorageUsageProbe>,
    path: PathBuf,
    threshold_percent: u8,
    logger: AppLogger,
}

impl DiskHealthIndicator {
    pub fn new(
        probe: Arc<dyn StorageUsageProbe>,
        path: impl Into<PathBuf>,
        threshold_percent: u8,
        logger: &AppLogger,
    ) -> Self {
        Self {
            probe,
            path: path.into(),
            threshold_percent,
            logger: logger.for_context("DiskHealthIndicator"),
        }
    }
}

#[async_trait]
impl HealthIndicator for DiskHealthIndicator {
    async fn is_healthy(&self, key: &str) -> HealthCheckResult {
        let usage = match self.probe.usage(&self.path) {
            Ok(usage) => usage,
            Err(error) => {
                self.logger.error(
                    format!("Disk health check failed: {error}"),
                    fields([("path", json!(self.path.display().to_string()))]),
                );
                return HealthCheckResult::down(key, error.to_string());
            }
        };

        if usage.exceeds(self.threshold_percent) {
            self.logger.warn(
                disk::LOW_SPACE,
                fields([
                    ("used_bytes", json!(usage.used_bytes())),
                    ("total_bytes", json!(usage.total_bytes)),
                    ("threshold_percent", json!(self.threshold_percent)),
                ]),
            );
            HealthCheckResult::down(key, disk::LOW_SPACE)
        } else {
            HealthCheckResult::up(key, disk::HEALTHY)
        }
    }
}
