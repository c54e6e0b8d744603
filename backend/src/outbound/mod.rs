//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! This module follows the hexagonal architecture pattern, providing concrete
//! implementations of domain port traits:
//!
//! - **persistence**: PostgreSQL liveness query using Diesel
//! - **cache**: Redis-backed [`CacheStore`](crate::domain::ports::CacheStore)
//! - **system**: filesystem capacity and process memory probes
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod cache;
pub mod persistence;
pub mod system;
