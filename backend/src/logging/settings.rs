//! Logging configuration loaded via OrthoConfig.

use std::path::PathBuf;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use super::LogLevel;
use super::level::ParseLogLevelError;
use super::rolling::RollingFileConfig;
use crate::settings::Environment;

const DEFAULT_DIRECTORY: &str = "logs";

/// Configuration values for the console and rolling file sinks.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "LOG")]
pub struct LogSettings {
    /// Threshold name (`error`, `warn`, `info`, `http`, `debug`, `verbose`).
    pub level: Option<String>,
    /// Directory holding the rolling files.
    pub dir: Option<PathBuf>,
    /// Size ceiling per file before its content is archived.
    pub max_bytes: Option<u64>,
    /// Files kept per stream, archives included.
    pub max_files: Option<usize>,
    /// Gzip archives.
    pub compress: Option<bool>,
    /// ANSI colour on the console.
    pub color: Option<bool>,
}

impl LogSettings {
    /// Configured threshold, else `info` in production and `debug`
    /// elsewhere.
    ///
    /// # Errors
    /// Returns [`ParseLogLevelError`] when `LOG_LEVEL` names no level.
    pub fn threshold(&self, environment: Environment) -> Result<LogLevel, ParseLogLevelError> {
        match self.level.as_deref() {
            Some(level) => level.parse(),
            None if environment.is_production() => Ok(LogLevel::Info),
            None => Ok(LogLevel::Debug),
        }
    }

    /// Directory for rolling files, defaulting to `logs`.
    #[must_use]
    pub fn directory(&self) -> PathBuf {
        self.dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DIRECTORY))
    }

    /// Console colour, defaulting to on outside production.
    #[must_use]
    pub fn colour(&self, environment: Environment) -> bool {
        self.color.unwrap_or(!environment.is_production())
    }

    /// Rolling configuration for a stream named `prefix`.
    #[must_use]
    pub fn rolling(&self, prefix: &str) -> RollingFileConfig {
        RollingFileConfig::new(prefix)
            .with_max_bytes(
                self.max_bytes
                    .unwrap_or(RollingFileConfig::DEFAULT_MAX_BYTES),
            )
            .with_max_files(
                self.max_files
                    .unwrap_or(RollingFileConfig::DEFAULT_MAX_FILES),
            )
            .with_compression(self.compress.unwrap_or(true))
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for logging configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 6] = [
        "LOG_LEVEL",
        "LOG_DIR",
        "LOG_MAX_BYTES",
        "LOG_MAX_FILES",
        "LOG_COMPRESS",
        "LOG_COLOR",
    ];

    fn load_from_empty_args() -> LogSettings {
        LogSettings::load_from_iter([OsString::from("auth-backend")]).expect("config should load")
    }

    #[rstest]
    fn defaults_depend_on_environment() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(settings.threshold(Environment::Production), Ok(LogLevel::Info));
        assert_eq!(settings.threshold(Environment::Development), Ok(LogLevel::Debug));
        assert!(!settings.colour(Environment::Production));
        assert!(settings.colour(Environment::Development));
        assert_eq!(settings.directory(), PathBuf::from("logs"));
        assert_eq!(
            settings.rolling("error"),
            RollingFileConfig::new("error")
        );
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("LOG_LEVEL", Some("warn".to_owned())),
            ("LOG_DIR", Some("/var/log/auth".to_owned())),
            ("LOG_MAX_BYTES", Some("1024".to_owned())),
            ("LOG_MAX_FILES", Some("3".to_owned())),
            ("LOG_COMPRESS", Some("false".to_owned())),
            ("LOG_COLOR", Some("true".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(settings.threshold(Environment::Development), Ok(LogLevel::Warn));
        assert_eq!(settings.directory(), PathBuf::from("/var/log/auth"));
        assert!(settings.colour(Environment::Production));
        assert_eq!(
            settings.rolling("combined"),
            RollingFileConfig::new("combined")
                .with_max_bytes(1024)
                .with_max_files(3)
                .with_compression(false)
        );
    }

    #[rstest]
    fn unknown_level_is_rejected() {
        let settings = LogSettings {
            level: Some("loud".to_owned()),
            dir: None,
            max_bytes: None,
            max_files: None,
            compress: None,
            color: None,
        };
        assert!(settings.threshold(Environment::Test).is_err());
    }
}
