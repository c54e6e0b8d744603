//! Port abstraction for the primary data store's liveness primitive.
use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by data store adapters while probing connectivity.
    pub enum DataStoreError {
        /// A connection could not be checked out or established.
        Connection => "data store connection failed",
        /// The round-trip query failed.
        Query => "data store query failed",
    }
}

/// Trivial round-trip against the data store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Issue the cheapest possible query; `Ok` means the store answered.
    async fn ping(&self) -> Result<(), DataStoreError>;
}
