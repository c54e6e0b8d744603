//! Dependency health checks.
//!
//! Purpose: probe the database, the cache, local disk capacity and process
//! memory, then fold the verdicts into one report for the readiness
//! endpoint.
//!
//! Public surface:
//! - HealthIndicator: the trait every probe implements.
//! - HealthCheckService: concurrent fan-out with a per-indicator timeout.
//! - AggregateHealthReport (built by `aggregate`): overall status plus the
//!   `info`, `error` and `details` maps.

pub mod constants;
mod cache;
mod data_store;
mod disk;
mod indicator;
mod memory;
mod report;
mod service;

pub use self::cache::CacheHealthIndicator;
pub use self::data_store::DataStoreHealthIndicator;
pub use self::disk::DiskHealthIndicator;
pub use self::indicator::HealthIndicator;
pub use self::memory::MemoryHealthIndicator;
pub use self::report::{
    AggregateHealthReport, HealthCheckResult, HealthStatus, OverallStatus, aggregate,
};
pub use self::service::{HealthCheckService, HealthRegistrationError};
