//! Keys, messages and probe parameters shared by the health indicators.

/// Data store probe.
pub mod database {
    /// Report key.
    pub const KEY: &str = "database";
    /// Message on success.
    pub const HEALTHY: &str = "Database connection is healthy";
    /// Fallback message when the failure carries no text.
    pub const FAILED: &str = "Database connection failed";
}

/// Cache round-trip probe.
pub mod cache {
    use std::time::Duration;

    /// Report key.
    pub const KEY: &str = "cache";
    /// Sentinel key written and removed by the probe.
    pub const TEST_KEY: &str = "health_check_test";
    /// Sentinel value written and read back.
    pub const TEST_VALUE: &str = "test_value";
    /// Expiry applied to the sentinel so a crashed probe leaves nothing behind.
    pub const TTL: Duration = Duration::from_secs(5);
    /// Message on success.
    pub const HEALTHY: &str = "Cache is healthy";
    /// Fallback message when the failure carries no text.
    pub const FAILED: &str = "Cache health check failed";
    /// Read-back value differed from the sentinel.
    pub const VERIFICATION_FAILED: &str = "Cache set/get verification failed";
}

/// Disk capacity probe.
pub mod disk {
    /// Report key.
    pub const KEY: &str = "disk";
    /// Default maximum used share of capacity, in percent.
    pub const THRESHOLD_PERCENT: u8 = 90;
    /// Default probed path, relative to the working directory.
    pub const PATH: &str = "..";
    /// Message on success.
    pub const HEALTHY: &str = "Disk is healthy";
    /// Usage crossed the threshold.
    pub const LOW_SPACE: &str = "Disk storage threshold exceeded";
}

/// Process memory probe.
pub mod memory {
    /// Report key.
    pub const KEY: &str = "memory";
    /// Default resident memory ceiling (300 MiB).
    pub const THRESHOLD_BYTES: u64 = 300 * 1024 * 1024;
    /// Message on success.
    pub const HEALTHY: &str = "Memory is healthy";
    /// Usage crossed the threshold.
    pub const LOW_HEAP: &str = "Memory heap threshold exceeded";
}
