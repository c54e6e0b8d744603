//! Health probe configuration loaded via OrthoConfig.

use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::health::constants::{disk, memory};

const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Thresholds and limits for the health indicators.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "HEALTH")]
pub struct HealthSettings {
    /// Path whose filesystem the disk probe samples.
    pub disk_path: Option<PathBuf>,
    /// Maximum used share of the disk, in percent.
    pub disk_threshold_percent: Option<u8>,
    /// Maximum resident memory, in bytes.
    pub memory_threshold_bytes: Option<u64>,
    /// Per-indicator time limit, in milliseconds.
    pub timeout_ms: Option<u64>,
}

impl HealthSettings {
    /// Disk probe path, defaulting to the parent of the working directory.
    #[must_use]
    pub fn disk_path(&self) -> PathBuf {
        self.disk_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(disk::PATH))
    }

    /// Disk usage threshold, capped at 100.
    #[must_use]
    pub fn disk_threshold_percent(&self) -> u8 {
        self.disk_threshold_percent
            .unwrap_or(disk::THRESHOLD_PERCENT)
            .min(100)
    }

    /// Resident memory ceiling.
    #[must_use]
    pub fn memory_threshold_bytes(&self) -> u64 {
        self.memory_threshold_bytes
            .unwrap_or(memory::THRESHOLD_BYTES)
    }

    /// Per-indicator time limit.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS))
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for health configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    fn load_from_empty_args() -> HealthSettings {
        HealthSettings::load_from_iter([OsString::from("auth-backend")])
            .expect("config should load")
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env([
            ("HEALTH_DISK_PATH", None::<String>),
            ("HEALTH_DISK_THRESHOLD_PERCENT", None::<String>),
            ("HEALTH_MEMORY_THRESHOLD_BYTES", None::<String>),
            ("HEALTH_TIMEOUT_MS", None::<String>),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(settings.disk_path(), PathBuf::from(".."));
        assert_eq!(settings.disk_threshold_percent(), 90);
        assert_eq!(settings.memory_threshold_bytes(), 300 * 1024 * 1024);
        assert_eq!(settings.timeout(), Duration::from_secs(5));
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("HEALTH_DISK_PATH", Some("/data".to_owned())),
            ("HEALTH_DISK_THRESHOLD_PERCENT", Some("75".to_owned())),
            ("HEALTH_MEMORY_THRESHOLD_BYTES", Some("1048576".to_owned())),
            ("HEALTH_TIMEOUT_MS", Some("250".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(settings.disk_path(), PathBuf::from("/data"));
        assert_eq!(settings.disk_threshold_percent(), 75);
        assert_eq!(settings.memory_threshold_bytes(), 1_048_576);
        assert_eq!(settings.timeout(), Duration::from_millis(250));
    }
}
