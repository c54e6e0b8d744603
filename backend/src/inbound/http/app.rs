//! Application factory shared by the server binary and integration tests.

use actix_web::body::BoxBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};

use super::boundary::ErrorBoundary;
use super::correlation::RequestCorrelation;
use super::health::health;
use super::state::HttpState;
use crate::logging::AppLogger;

/// Everything one worker's `App` needs.
#[derive(Clone)]
pub struct AppDependencies {
    pub state: web::Data<HttpState>,
    pub logger: AppLogger,
}

/// Build the application with correlation outermost and the error boundary
/// directly inside it.
pub fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<BoxBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies { state, logger } = deps;

    App::new()
        .app_data(state)
        .wrap(ErrorBoundary::new(&logger))
        .wrap(RequestCorrelation::new(&logger))
        .service(health)
}
