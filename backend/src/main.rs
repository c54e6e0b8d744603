//! Backend entry-point: loads configuration, builds the logger and the shared
//! dependency clients, then serves the health endpoint behind the request
//! correlation and error boundary middleware.

mod server;

use std::ffi::OsString;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use mockable::{DefaultClock, DefaultEnv};
use ortho_config::OrthoConfig;
use serde_json::json;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use auth_backend::logging::{AppLogger, AppLoggerLayer, Fields, LogSettings, build_logger, fields};
use auth_backend::outbound::cache::RedisCacheStore;
use auth_backend::outbound::persistence::{DbPool, DieselDataStore, PoolConfig};
use auth_backend::settings::{HealthSettings, ServiceSettings, service_settings_from_env};
use server::{HealthDependencies, build_http_state, create_server};

const PROGRAM: &str = "auth-backend";

/// Route `tracing` events from actix, bb8 and friends into the app logger.
fn install_tracing(logger: &AppLogger) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if let Err(error) = tracing_subscriber::registry()
        .with(filter)
        .with(AppLoggerLayer::new(logger.clone()))
        .try_init()
    {
        logger.warn(
            "tracing init failed",
            fields([("error", json!(error.to_string()))]),
        );
    }
}

async fn serve(
    service: &ServiceSettings,
    health: &HealthSettings,
    logger: &AppLogger,
) -> io::Result<()> {
    let bootstrap = logger.for_context("Bootstrap");

    let pool = DbPool::new(
        PoolConfig::new(service.database_url.as_str(), service.database_pool),
        logger,
    )
        .await
        .map_err(io::Error::other)?;
    let cache = RedisCacheStore::connect(&service.redis.url(), logger)
        .await
        .map_err(io::Error::other)?;

    let state = build_http_state(
        HealthDependencies {
            data_store: Arc::new(DieselDataStore::new(pool.clone(), logger)),
            cache: Arc::new(cache),
        },
        health,
        logger,
    )?;

    let bind_addr = SocketAddr::from(([0, 0, 0, 0], service.port));
    let server = create_server(bind_addr, state, logger)?;
    bootstrap.info(
        format!("{} listening on {bind_addr}", service.service_name),
        fields([("environment", json!(service.environment.as_str()))]),
    );

    let result = server.await;
    bootstrap.info("Server stopped", Fields::new());
    pool.disconnect();
    result
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> io::Result<()> {
    let service = service_settings_from_env(&DefaultEnv::new()).map_err(io::Error::other)?;
    let log_settings = LogSettings::load_from_iter([OsString::from(PROGRAM)])
        .map_err(|error| io::Error::other(error.to_string()))?;
    let health_settings = HealthSettings::load_from_iter([OsString::from(PROGRAM)])
        .map_err(|error| io::Error::other(error.to_string()))?;

    let logger = build_logger(&service, &log_settings, Arc::new(DefaultClock))?;
    install_tracing(&logger);

    let result = serve(&service, &health_settings, &logger).await;
    if let Err(error) = &result {
        logger.for_context("Bootstrap").error(
            "Server failed",
            fields([("error", json!(error.to_string()))]),
        );
    }
    logger.flush().await;
    logger.shutdown();
    result
}
