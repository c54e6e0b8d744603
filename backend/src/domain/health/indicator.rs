//! Indicator contract.

use async_trait::async_trait;

use super::HealthCheckResult;

/// Probes one dependency and reports an up/down verdict.
///
/// Implementations must not fail: every probe error is caught and turned
/// into a [`HealthCheckResult::down`] carrying the failure message. A panic
/// is still tolerated by the aggregating service, which records the key as
/// down.
#[async_trait]
pub trait HealthIndicator: Send + Sync {
    /// Run the probe and report under `key`.
    async fn is_healthy(&self, key: &str) -> HealthCheckResult;
}
