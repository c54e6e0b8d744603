//! Ports for host resource measurements used by the disk and memory probes.
use std::path::Path;

use super::define_port_error;

define_port_error! {
    /// Errors raised while sampling host resources.
    pub enum SystemUsageError {
        /// The measurement source could not be read.
        Unavailable => "resource usage unavailable",
    }
}

/// Capacity snapshot for the filesystem holding a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageUsage {
    /// Total capacity in bytes.
    pub total_bytes: u64,
    /// Bytes still available to the process.
    pub available_bytes: u64,
}

impl StorageUsage {
    /// Bytes currently in use.
    #[must_use]
    pub fn used_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.available_bytes)
    }

    /// Whether usage is strictly above `threshold_percent` of capacity.
    ///
    /// # Examples
    /// ```
    /// use auth_backend::domain::ports::StorageUsage;
    ///
    /// let usage = StorageUsage { total_bytes: 100, available_bytes: 5 };
    /// assert!(usage.exceeds(90));
    /// assert!(!usage.exceeds(95));
    /// ```
    #[must_use]
    pub fn exceeds(&self, threshold_percent: u8) -> bool {
        u128::from(self.used_bytes()) * 100
            > u128::from(self.total_bytes) * u128::from(threshold_percent)
    }
}

/// Samples filesystem capacity.
#[cfg_attr(test, mockall::automock)]
pub trait StorageUsageProbe: Send + Sync {
    /// Capacity of the filesystem containing `path`.
    fn usage(&self, path: &Path) -> Result<StorageUsage, SystemUsageError>;
}

/// Samples the process' resident memory.
#[cfg_attr(test, mockall::automock)]
pub trait MemoryUsageProbe: Send + Sync {
    /// Resident set size in bytes.
    fn resident_bytes(&self) -> Result<u64, SystemUsageError>;
}
