//! Middleware establishing the per-request correlation context.
//!
//! Each incoming request gets a [`CorrelationContext`] scoped around the rest
//! of the service chain, so every log record emitted while handling it
//! carries the same `requestId`. The identifier is echoed back in the
//! `X-Request-ID` response header. The middleware also writes the request
//! log: a `debug` record on arrival and one completion record whose level
//! follows the response status.

use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};

use actix_web::Error;
use actix_web::body::{BodySize, MessageBody};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{self, HeaderName, HeaderValue};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use serde_json::json;

use crate::domain::{CorrelationContext, InboundRequest, REQUEST_ID_HEADER};
use crate::logging::{AppLogger, LogLevel, fields};

/// Context label used for request log records.
pub const HTTP_CONTEXT: &str = "HTTP";

/// Correlation middleware. Wrap it outermost so the context covers every
/// other middleware, the error boundary included.
///
/// # Examples
/// ```no_run
/// use actix_web::App;
/// use auth_backend::inbound::http::RequestCorrelation;
/// use auth_backend::logging::AppLogger;
///
/// # fn demo(logger: AppLogger) {
/// let _app = App::new().wrap(RequestCorrelation::new(&logger));
/// # }
/// ```
#[derive(Clone)]
pub struct RequestCorrelation {
    logger: AppLogger,
}

impl RequestCorrelation {
    pub fn new(logger: &AppLogger) -> Self {
        Self {
            logger: logger.for_context(HTTP_CONTEXT),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestCorrelation
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestCorrelationMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestCorrelationMiddleware {
            service: Rc::new(service),
            logger: self.logger.clone(),
        }))
    }
}

/// Service wrapper produced by [`RequestCorrelation`].
pub struct RequestCorrelationMiddleware<S> {
    service: Rc<S>,
    logger: AppLogger,
}

fn completion_level(status: u16) -> (LogLevel, &'static str) {
    match status {
        500.. => (LogLevel::Error, "Request completed with error"),
        400..=499 => (LogLevel::Warn, "Request completed with issue"),
        _ => (LogLevel::Info, "Request completed"),
    }
}

fn content_length(size: BodySize) -> u64 {
    match size {
        BodySize::Sized(length) => length,
        BodySize::None | BodySize::Stream => 0,
    }
}

impl<S, B> Service<ServiceRequest> for RequestCorrelationMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let url = req
            .uri()
            .path_and_query()
            .map_or_else(|| req.path().to_owned(), |pq| pq.as_str().to_owned());
        let method = req.method().as_str().to_owned();
        let incoming_user_agent = self.logger.enabled(LogLevel::Debug).then(|| {
            req.headers()
                .get(header::USER_AGENT)
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default()
                .to_owned()
        });
        let client_ip = req
            .connection_info()
            .realip_remote_addr()
            .map(str::to_owned);
        let context = Arc::new(CorrelationContext::begin(InboundRequest {
            request_id: req
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok()),
            method: &method,
            path: &url,
            client_ip: client_ip.as_deref(),
        }));

        let service = Rc::clone(&self.service);
        let logger = self.logger.clone();
        let scoped = Arc::clone(&context);
        Box::pin(CorrelationContext::scope(scoped, async move {
            if let Some(user_agent) = incoming_user_agent {
                logger.debug(
                    format!("Incoming request {method} {url}"),
                    fields([("user_agent", json!(user_agent))]),
                );
            }

            let mut res = service.call(req).await?;

            match HeaderValue::from_str(context.request_id().as_str()) {
                Ok(value) => {
                    res.headers_mut()
                        .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
                }
                Err(error) => logger.error(
                    "failed to encode request identifier header",
                    fields([("error", json!(error.to_string()))]),
                ),
            }

            let status = res.status().as_u16();
            let elapsed_ms = context.elapsed().as_millis();
            let length = content_length(res.response().body().size());
            let (level, prefix) = completion_level(status);
            logger.log(
                level,
                format!("{prefix} {method} {url} {status} {length} - {elapsed_ms}ms"),
                None,
                fields([
                    ("status_code", json!(status)),
                    ("response_time_ms", json!(elapsed_ms)),
                ]),
            );
            Ok(res)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::capturing_logger;
    use actix_web::{App, HttpResponse, test, web};
    use rstest::rstest;

    async fn echo_request_id() -> HttpResponse {
        let id = CorrelationContext::current()
            .map(|context| context.request_id().to_string())
            .unwrap_or_default();
        HttpResponse::Ok().body(id)
    }

    #[rstest]
    #[case(200, LogLevel::Info, "Request completed")]
    #[case(404, LogLevel::Warn, "Request completed with issue")]
    #[case(503, LogLevel::Error, "Request completed with error")]
    #[::core::prelude::v1::test]
    fn completion_level_follows_status(
        #[case] status: u16,
        #[case] level: LogLevel,
        #[case] prefix: &str,
    ) {
        assert_eq!(completion_level(status), (level, prefix));
    }

    #[rstest]
    #[actix_web::test]
    async fn generates_an_id_visible_to_the_handler_and_the_header() {
        let (logger, _) = capturing_logger(LogLevel::Debug);
        let app = test::init_service(
            App::new()
                .wrap(RequestCorrelation::new(&logger))
                .route("/", web::get().to(echo_request_id)),
        )
        .await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        let header = res
            .headers()
            .get(REQUEST_ID_HEADER)
            .expect("request id header")
            .to_str()
            .expect("header is ascii")
            .to_owned();
        let body = test::read_body(res).await;

        assert!(!header.is_empty());
        assert_eq!(std::str::from_utf8(&body).expect("utf8 body"), header);
    }

    #[rstest]
    #[actix_web::test]
    async fn echoes_inbound_id_and_logs_request_lifecycle() {
        let (logger, logs) = capturing_logger(LogLevel::Debug);
        let app = test::init_service(
            App::new()
                .wrap(RequestCorrelation::new(&logger))
                .route("/login", web::post().to(|| async { HttpResponse::NotFound().body("nope") })),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/login?next=home")
            .insert_header((REQUEST_ID_HEADER, "client-42"))
            .insert_header((header::USER_AGENT, "curl/8.5.0"))
            .to_request();
        let res = test::call_service(&app, req).await;
        logger.flush().await;

        assert_eq!(
            res.headers().get(REQUEST_ID_HEADER).and_then(|v| v.to_str().ok()),
            Some("client-42")
        );
        let records = logs.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].level(), LogLevel::Debug);
        assert_eq!(records[0].message(), "Incoming request POST /login?next=home");
        assert_eq!(records[0].field("user_agent"), Some(&json!("curl/8.5.0")));
        assert_eq!(records[1].level(), LogLevel::Warn);
        assert!(
            records[1]
                .message()
                .starts_with("Request completed with issue POST /login?next=home 404 4 - ")
        );
        assert_eq!(records[1].field("status_code"), Some(&json!(404)));
        for record in &records {
            assert_eq!(record.context(), Some(HTTP_CONTEXT));
            assert_eq!(record.field("requestId"), Some(&json!("client-42")));
            assert_eq!(record.field("method"), Some(&json!("POST")));
        }
    }

    #[rstest]
    #[actix_web::test]
    async fn arrival_record_is_skipped_above_debug() {
        let (logger, logs) = capturing_logger(LogLevel::Info);
        let app = test::init_service(
            App::new()
                .wrap(RequestCorrelation::new(&logger))
                .route("/", web::get().to(echo_request_id)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/")
            .insert_header((header::USER_AGENT, "curl/8.5.0"))
            .to_request();
        test::call_service(&app, req).await;
        logger.flush().await;

        let records = logs.records();
        assert_eq!(records.len(), 1);
        assert!(records[0].message().starts_with("Request completed GET / 200"));
        assert!(records.iter().all(|record| record.field("user_agent").is_none()));
    }
}
