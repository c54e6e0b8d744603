//! Shared PostgreSQL connection pool.
//!
//! One [`DbPool`] is built at start-up and cloned into every adapter that
//! needs a connection. `bb8` owns the connections and `diesel-async` drives
//! them without blocking the runtime. No connection is opened until the
//! first checkout, so the process starts even while the database is down and
//! the health endpoint reports it.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use serde_json::json;

use crate::logging::{AppLogger, Fields, fields};
use crate::settings::DatabasePoolSettings;

const POOL_CONTEXT: &str = "Database";

/// Errors raised by pool operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// No connection could be checked out in time.
    #[error("failed to get connection from pool: {message}")]
    Checkout { message: String },

    /// The pool could not be constructed.
    #[error("failed to build connection pool: {message}")]
    Build { message: String },
}

impl PoolError {
    pub fn checkout(message: impl Into<String>) -> Self {
        Self::Checkout {
            message: message.into(),
        }
    }

    pub fn build(message: impl Into<String>) -> Self {
        Self::Build {
            message: message.into(),
        }
    }
}

/// Where to connect and how many connections to hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    database_url: String,
    max_size: u32,
    connection_timeout: Duration,
}

impl PoolConfig {
    /// Pool for `database_url` sized by `settings`.
    pub fn new(database_url: impl Into<String>, settings: DatabasePoolSettings) -> Self {
        Self {
            database_url: database_url.into(),
            max_size: settings.max_size.max(1),
            connection_timeout: settings.connection_timeout,
        }
    }
}

/// Cloneable handle to the connection pool.
#[derive(Clone)]
pub struct DbPool {
    inner: Pool<AsyncPgConnection>,
    logger: AppLogger,
}

impl DbPool {
    /// Build the pool described by `config`.
    ///
    /// # Errors
    /// Returns [`PoolError::Build`] when `bb8` rejects the configuration.
    pub async fn new(config: PoolConfig, logger: &AppLogger) -> Result<Self, PoolError> {
        let logger = logger.for_context(POOL_CONTEXT);
        logger.info("Connecting to database...", Fields::new());
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_size)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .await
            .map_err(|err| {
                let error = PoolError::build(err.to_string());
                logger.error(
                    "Database connection failed",
                    fields([("error", json!(error.to_string()))]),
                );
                error
            })?;

        logger.info(
            "Database pool ready",
            fields([
                ("max_size", json!(config.max_size)),
                (
                    "connection_timeout_ms",
                    json!(u64::try_from(config.connection_timeout.as_millis()).unwrap_or(u64::MAX)),
                ),
            ]),
        );
        Ok(Self {
            inner: pool,
            logger,
        })
    }

    /// Give up this handle at shutdown.
    ///
    /// Connections close when the last clone is dropped; the record states
    /// how many were still open when this handle let go.
    pub fn disconnect(self) {
        let Self { inner, logger } = self;
        let state = inner.state();
        drop(inner);
        logger.info(
            "Database pool released",
            fields([
                ("open_connections", json!(state.connections)),
                ("idle_connections", json!(state.idle_connections)),
            ]),
        );
    }

    /// Check out a connection.
    ///
    /// # Errors
    /// Returns [`PoolError::Checkout`] when none is available within the
    /// configured timeout.
    pub async fn get(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, PoolError> {
        self.inner
            .get()
            .await
            .map_err(|err| PoolError::checkout(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogLevel;
    use crate::test_support::capturing_logger;
    use rstest::rstest;

    const UNREACHABLE: &str = "postgres://auth@127.0.0.1:1/auth";

    fn settings(max_size: u32, timeout_ms: u64) -> DatabasePoolSettings {
        DatabasePoolSettings {
            max_size,
            connection_timeout: Duration::from_millis(timeout_ms),
        }
    }

    #[rstest]
    #[case(settings(20, 5_000), 20)]
    #[case(settings(0, 5_000), 1)]
    fn config_takes_its_limits_from_settings(
        #[case] settings: DatabasePoolSettings,
        #[case] expected_size: u32,
    ) {
        let config = PoolConfig::new(UNREACHABLE, settings);

        assert_eq!(config.max_size, expected_size);
        assert_eq!(config.connection_timeout, Duration::from_secs(5));
    }

    #[rstest]
    #[tokio::test]
    async fn building_does_not_connect_until_checkout() {
        let (logger, logs) = capturing_logger(LogLevel::Info);

        let pool = DbPool::new(PoolConfig::new(UNREACHABLE, settings(4, 50)), &logger)
            .await
            .expect("pool builds lazily");
        let checkout = pool.get().await;

        assert!(matches!(checkout, Err(PoolError::Checkout { .. })));
        logger.flush().await;
        assert!(logs.messages().contains(&"Database pool ready".to_owned()));
    }

    #[rstest]
    #[tokio::test]
    async fn release_reports_connections_still_open() {
        let (logger, logs) = capturing_logger(LogLevel::Info);
        let pool = DbPool::new(PoolConfig::new(UNREACHABLE, settings(4, 50)), &logger)
            .await
            .expect("pool builds lazily");
        let still_shared = pool.clone();

        pool.disconnect();
        logger.flush().await;

        let released: Vec<_> = logs
            .records()
            .into_iter()
            .filter(|record| record.message() == "Database pool released")
            .collect();
        assert_eq!(released.len(), 1);
        assert_eq!(released[0].field("open_connections"), Some(&json!(0)));
        assert!(
            !logs
                .messages()
                .iter()
                .any(|message| message.starts_with("Disconnected"))
        );
        drop(still_shared);
    }

    #[rstest]
    fn pool_error_display() {
        assert!(PoolError::checkout("connection refused")
            .to_string()
            .contains("connection refused"));
        assert!(PoolError::build("invalid URL").to_string().contains("invalid URL"));
    }
}
