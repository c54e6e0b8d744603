//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain services and remain testable without I/O.

use std::sync::Arc;

use crate::domain::health::HealthCheckService;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub health: Arc<HealthCheckService>,
}

impl HttpState {
    pub fn new(health: Arc<HealthCheckService>) -> Self {
        Self { health }
    }
}
