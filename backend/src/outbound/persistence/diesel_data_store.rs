//! Diesel-backed liveness primitive for the data store health probe.

use async_trait::async_trait;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_query;
use diesel_async::RunQueryDsl;
use serde_json::json;

use super::pool::{DbPool, PoolError};
use crate::domain::ports::{DataStore, DataStoreError};
use crate::logging::{AppLogger, LogLevel, fields};

const STORE_CONTEXT: &str = "DataStore";

/// Runs `SELECT 1` on a pooled connection.
#[derive(Clone)]
pub struct DieselDataStore {
    pool: DbPool,
    logger: AppLogger,
}

impl DieselDataStore {
    pub fn new(pool: DbPool, logger: &AppLogger) -> Self {
        Self {
            pool,
            logger: logger.for_context(STORE_CONTEXT),
        }
    }
}

fn map_pool_error(error: PoolError) -> DataStoreError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            DataStoreError::connection(message)
        }
    }
}

fn log_ping_failure(logger: &AppLogger, error: &DataStoreError) {
    if logger.enabled(LogLevel::Debug) {
        logger.debug(
            "Data store ping failed",
            fields([("error", json!(error.to_string()))]),
        );
    }
}

fn map_diesel_error(error: DieselError) -> DataStoreError {
    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
            DataStoreError::connection(info.message().to_owned())
        }
        other => DataStoreError::query(other.to_string()),
    }
}

#[async_trait]
impl DataStore for DieselDataStore {
    async fn ping(&self) -> Result<(), DataStoreError> {
        let result = match self.pool.get().await {
            Ok(mut conn) => sql_query("SELECT 1")
                .execute(&mut conn)
                .await
                .map(drop)
                .map_err(map_diesel_error),
            Err(error) => Err(map_pool_error(error)),
        };
        if let Err(error) = &result {
            log_ping_failure(&self.logger, error);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbound::persistence::PoolConfig;
    use crate::settings::DatabasePoolSettings;
    use crate::test_support::capturing_logger;
    use rstest::rstest;
    use std::time::Duration;

    #[rstest]
    #[case(PoolError::checkout("timed out waiting for connection"))]
    #[case(PoolError::build("invalid URL"))]
    fn pool_failures_are_connection_errors(#[case] error: PoolError) {
        assert!(matches!(
            map_pool_error(error),
            DataStoreError::Connection { .. }
        ));
    }

    #[rstest]
    fn query_failures_keep_diesel_text() {
        let error = map_diesel_error(DieselError::NotFound);
        assert_eq!(error, DataStoreError::query("Record not found"));
    }

    #[rstest]
    #[tokio::test]
    async fn ping_failures_go_to_the_app_logger() {
        let (logger, logs) = capturing_logger(LogLevel::Debug);
        let pool = DbPool::new(
            PoolConfig::new(
                "postgres://auth@127.0.0.1:1/auth",
                DatabasePoolSettings {
                    max_size: 1,
                    connection_timeout: Duration::from_millis(50),
                },
            ),
            &logger,
        )
        .await
        .expect("pool builds lazily");
        let store = DieselDataStore::new(pool, &logger);

        let result = store.ping().await;

        assert!(matches!(result, Err(DataStoreError::Connection { .. })));
        logger.flush().await;
        let failures: Vec<_> = logs
            .at_level(LogLevel::Debug)
            .into_iter()
            .filter(|record| record.message() == "Data store ping failed")
            .collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].context(), Some(STORE_CONTEXT));
    }
}
