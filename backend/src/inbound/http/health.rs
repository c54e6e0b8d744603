//! Health endpoint: aggregated dependency probe for orchestration and load
//! balancers.

use actix_web::{HttpResponse, get, web};

use super::cache_control::no_store_header;
use super::state::HttpState;

/// Probe every registered dependency.
///
/// Returns 200 with `status: "ok"` when every indicator is up, 503 with
/// `status: "error"` otherwise. The body always lists every indicator under
/// `details`. A fresh report is computed on every call.
#[get("/health")]
pub async fn health(state: web::Data<HttpState>) -> HttpResponse {
    let report = state.health.check().await;
    let mut response = if report.is_ok() {
        HttpResponse::Ok()
    } else {
        HttpResponse::ServiceUnavailable()
    };
    response.insert_header(no_store_header()).json(&report)
}
