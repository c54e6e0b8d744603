//! Builders for the shared HTTP state.

use std::io;
use std::sync::Arc;

use actix_web::web;

use auth_backend::domain::health::constants::{cache, database, disk, memory};
use auth_backend::domain::health::{
    CacheHealthIndicator, DataStoreHealthIndicator, DiskHealthIndicator, HealthCheckService,
    MemoryHealthIndicator,
};
use auth_backend::domain::ports::{CacheStore, DataStore};
use auth_backend::inbound::http::state::HttpState;
use auth_backend::logging::AppLogger;
use auth_backend::outbound::system::{FsStorageProbe, ProcMemoryProbe};
use auth_backend::settings::HealthSettings;

/// Shared clients the health indicators probe.
pub struct HealthDependencies {
    pub data_store: Arc<dyn DataStore>,
    pub cache: Arc<dyn CacheStore>,
}

/// Register the four indicators and wrap the service in handler state.
///
/// # Errors
/// Returns an error if two indicators share a key.
pub fn build_http_state(
    deps: HealthDependencies,
    settings: &HealthSettings,
    logger: &AppLogger,
) -> io::Result<web::Data<HttpState>> {
    let HealthDependencies { data_store, cache } = deps;
    let service = HealthCheckService::new(settings.timeout(), logger)
        .with_indicator(
            database::KEY,
            Arc::new(DataStoreHealthIndicator::new(data_store, logger)),
        )
        .and_then(|service| {
            service.with_indicator(cache::KEY, Arc::new(CacheHealthIndicator::new(cache, logger)))
        })
        .and_then(|service| {
            service.with_indicator(
                disk::KEY,
                Arc::new(DiskHealthIndicator::new(
                    Arc::new(FsStorageProbe),
                    settings.disk_path(),
                    settings.disk_threshold_percent(),
                    logger,
                )),
            )
        })
        .and_then(|service| {
            service.with_indicator(
                memory::KEY,
                Arc::new(MemoryHealthIndicator::new(
                    Arc::new(ProcMemoryProbe::default()),
                    settings.memory_threshold_bytes(),
                    logger,
                )),
            )
        })
        .map_err(io::Error::other)?;

    Ok(web::Data::new(HttpState::new(Arc::new(service))))
}
