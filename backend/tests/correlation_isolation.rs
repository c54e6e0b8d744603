//! Behavioural tests for correlation isolation under concurrency.
//!
//! Many requests are interleaved on one single-threaded worker. Every record
//! logged while handling a request, including from spawned work, must carry
//! that request's identifier and no other.

use std::time::Duration;

use actix_web::{App, HttpResponse, test, web};
use auth_backend::domain::{CorrelationContext, REQUEST_ID_HEADER};
use auth_backend::inbound::http::{ErrorBoundary, RequestCorrelation};
use auth_backend::logging::{AppLogger, Fields, LogLevel, fields};
use auth_backend::test_support::capturing_logger;
use futures::future::join_all;
use rstest::rstest;
use serde_json::json;

const REQUESTS: u64 = 40;

async fn work(logger: web::Data<AppLogger>, n: web::Path<u64>) -> HttpResponse {
    let n = n.into_inner();
    let logger = logger.get_ref().for_context("Worker");
    logger.info("step one", fields([("n", json!(n))]));

    tokio::time::sleep(Duration::from_millis(n % 7)).await;
    tokio::task::yield_now().await;

    let spawned_logger = logger.clone();
    let spawned = tokio::spawn(CorrelationContext::propagate(async move {
        tokio::task::yield_now().await;
        spawned_logger.info("spawned", fields([("n", json!(n))]));
        CorrelationContext::current().map(|context| context.request_id().to_string())
    }))
    .await
    .ok()
    .flatten();

    logger.info("step two", fields([("n", json!(n))]));
    HttpResponse::Ok().body(spawned.unwrap_or_default())
}

#[rstest]
#[actix_web::test]
async fn interleaved_requests_never_share_correlation() {
    let (logger, logs) = capturing_logger(LogLevel::Debug);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(logger.clone()))
            .wrap(ErrorBoundary::new(&logger))
            .wrap(RequestCorrelation::new(&logger))
            .route("/work/{n}", web::get().to(work)),
    )
    .await;

    let calls = (0..REQUESTS).map(|n| {
        let req = test::TestRequest::get()
            .uri(&format!("/work/{n}"))
            .insert_header((REQUEST_ID_HEADER, format!("req-{n}")))
            .to_request();
        test::call_service(&app, req)
    });
    let responses = join_all(calls).await;
    for (n, res) in (0..REQUESTS).zip(responses) {
        assert_eq!(
            res.headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok()),
            Some(format!("req-{n}").as_str())
        );
        let body = test::read_body(res).await;
        assert_eq!(body, format!("req-{n}").as_bytes());
    }
    logger.flush().await;

    let worker_records: Vec<_> = logs
        .records()
        .into_iter()
        .filter(|record| record.context() == Some("Worker"))
        .collect();
    assert_eq!(worker_records.len(), usize::try_from(REQUESTS * 3).expect("fits"));
    for record in &worker_records {
        let n = record
            .field("n")
            .and_then(serde_json::Value::as_u64)
            .expect("worker records carry n");
        assert_eq!(
            record.field("requestId"),
            Some(&json!(format!("req-{n}"))),
            "record {:?} leaked into another request",
            record.message()
        );
        assert_eq!(record.field("path"), Some(&json!(format!("/work/{n}"))));
    }
}

#[rstest]
#[actix_web::test]
async fn records_outside_a_request_have_no_correlation() {
    let (logger, logs) = capturing_logger(LogLevel::Info);

    logger.info("startup", Fields::new());
    let spawned = logger.clone();
    tokio::spawn(CorrelationContext::propagate(async move {
        spawned.info("background", Fields::new());
    }))
    .await
    .expect("task completes");
    logger.flush().await;

    let records = logs.records();
    assert_eq!(records.len(), 2);
    for record in records {
        assert!(record.field("requestId").is_none());
        assert!(record.correlation().is_empty());
        assert_eq!(record.defaults().get("service"), Some(&json!("auth-backend")));
    }
}
