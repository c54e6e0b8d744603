//! Domain ports for the dependencies the health probes exercise.
//!
//! Ports describe how the domain expects to interact with driven adapters
//! (data store, cache, host resources). Each trait exposes strongly typed
//! errors so adapters map their failures into predictable variants.

mod macros;
pub(crate) use macros::define_port_error;

mod cache_store;
mod data_store;
mod system_usage;

#[cfg(test)]
pub use cache_store::MockCacheStore;
pub use cache_store::{CacheStore, CacheStoreError};
#[cfg(test)]
pub use data_store::MockDataStore;
pub use data_store::{DataStore, DataStoreError};
#[cfg(test)]
pub use system_usage::{MockMemoryUsageProbe, MockStorageUsageProbe};
pub use system_usage::{
    MemoryUsageProbe, StorageUsage, StorageUsageProbe, SystemUsageError,
};
