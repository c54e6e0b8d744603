//! Behavioural tests for the `X-Request-ID` response header.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{test, web};
use auth_backend::domain::REQUEST_ID_HEADER;
use auth_backend::domain::health::HealthCheckService;
use auth_backend::inbound::http::state::HttpState;
use auth_backend::inbound::http::{AppDependencies, build_app};
use auth_backend::logging::LogLevel;
use auth_backend::test_support::{StaticIndicator, capturing_logger};
use rstest::rstest;

async fn request_ids(inbound: Option<&str>, count: usize) -> Vec<Option<String>> {
    let (logger, _) = capturing_logger(LogLevel::Info);
    let health = HealthCheckService::new(Duration::from_secs(1), &logger)
        .with_indicator("database", Arc::new(StaticIndicator::up("fine")))
        .expect("unique key");
    let app = test::init_service(build_app(AppDependencies {
        state: web::Data::new(HttpState::new(Arc::new(health))),
        logger,
    }))
    .await;

    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        let mut req = test::TestRequest::get().uri("/health");
        if let Some(id) = inbound {
            req = req.insert_header((REQUEST_ID_HEADER, id));
        }
        let res = test::call_service(&app, req.to_request()).await;
        ids.push(
            res.headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned),
        );
    }
    ids
}

#[rstest]
#[actix_web::test]
async fn every_response_carries_a_fresh_identifier() {
    let ids = request_ids(None, 20).await;

    let ids: Vec<String> = ids
        .into_iter()
        .map(|id| id.expect("X-Request-ID header present"))
        .collect();
    assert!(ids.iter().all(|id| !id.is_empty()));
    let distinct: HashSet<_> = ids.iter().collect();
    assert_eq!(distinct.len(), ids.len());
}

#[rstest]
#[case("5b3f1c2e-upstream")]
#[case("lb-0001")]
#[actix_web::test]
async fn inbound_identifiers_are_echoed(#[case] inbound: &str) {
    let ids = request_ids(Some(inbound), 2).await;

    assert_eq!(ids, vec![Some(inbound.to_owned()); 2]);
}
