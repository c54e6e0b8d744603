//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! The only query this service issues is the liveness round-trip behind the
//! data store health probe. Connections are managed via `bb8` pools with
//! async integration through `diesel-async`, and every failure is mapped to
//! the domain's [`DataStoreError`](crate::domain::ports::DataStoreError).
//!
//! # Example
//!
//! ```ignore
//! use auth_backend::outbound::persistence::{DbPool, DieselDataStore, PoolConfig};
//!
//! let config = PoolConfig::new("postgres://localhost/mydb", settings.database_pool);
//! let pool = DbPool::new(config, &logger).await?;
//! let store = DieselDataStore::new(pool, &logger);
//! ```

mod diesel_data_store;
mod pool;

pub use diesel_data_store::DieselDataStore;
pub use pool::{DbPool, PoolConfig, PoolError};
