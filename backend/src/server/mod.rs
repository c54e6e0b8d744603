//! Server construction and dependency wiring.

mod state_builders;

pub use state_builders::{HealthDependencies, build_http_state};

use std::net::SocketAddr;

use actix_web::dev::Server;
use actix_web::{HttpServer, web};

use auth_backend::inbound::http::state::HttpState;
use auth_backend::inbound::http::{AppDependencies, build_app};
use auth_backend::logging::AppLogger;

/// Construct an Actix HTTP server bound to `bind_addr`.
///
/// # Returns
/// A spawned [`Server`] that must be awaited to drive the listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    bind_addr: SocketAddr,
    state: web::Data<HttpState>,
    logger: &AppLogger,
) -> std::io::Result<Server> {
    let logger = logger.clone();
    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            state: state.clone(),
            logger: logger.clone(),
        })
    })
    .bind(bind_addr)?
    .run();
    Ok(server)
}
