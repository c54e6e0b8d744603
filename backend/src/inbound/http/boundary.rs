//! Global error boundary.
//!
//! Every error escaping a handler or an inner middleware passes through
//! [`ErrorBoundary`], which writes exactly one log record for it and makes
//! sure the client sees the uniform envelope. [`ApiError`] values keep the
//! response their `ResponseError` impl rendered. Any other error is logged
//! in full and replaced by the generic internal-error envelope. A handler
//! that panics is treated the same way as one returning an unknown error.

use std::any::Any;
use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::panic::AssertUnwindSafe;
use std::rc::Rc;
use std::task::{Context, Poll};

use actix_web::Error;
use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use futures_util::FutureExt;
use futures_util::future::{LocalBoxFuture, Ready, ready};
use serde_json::{Value, json};

use super::error::{ApiError, internal_error_response};
use crate::logging::{AppLogger, Fields};

/// Context label used for error boundary records.
pub const BOUNDARY_CONTEXT: &str = "ErrorBoundary";

/// Error boundary middleware. Wrap it inside
/// [`RequestCorrelation`](super::RequestCorrelation) so its records carry the
/// request's correlation fields.
#[derive(Clone)]
pub struct ErrorBoundary {
    logger: AppLogger,
}

impl ErrorBoundary {
    pub fn new(logger: &AppLogger) -> Self {
        Self {
            logger: logger.for_context(BOUNDARY_CONTEXT),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ErrorBoundary
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = ErrorBoundaryMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ErrorBoundaryMiddleware {
            service: Rc::new(service),
            logger: self.logger.clone(),
        }))
    }
}

/// Service wrapper produced by [`ErrorBoundary`].
pub struct ErrorBoundaryMiddleware<S> {
    service: Rc<S>,
    logger: AppLogger,
}

fn cause_chain(error: &dyn StdError) -> Value {
    let mut causes = Vec::new();
    let mut next = error.source();
    while let Some(cause) = next {
        causes.push(cause.to_string());
        next = cause.source();
    }
    if causes.is_empty() {
        Value::Null
    } else {
        json!(causes.join(": "))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "handler panicked".to_owned())
}

fn report_panic(logger: &AppLogger, payload: &(dyn Any + Send)) {
    let mut fields = Fields::new();
    fields.insert(
        "stack".to_owned(),
        json!(Backtrace::force_capture().to_string()),
    );
    fields.insert("cause".to_owned(), Value::Null);
    logger.error(panic_message(payload), fields);
}

/// Log one escaped error. Returns `true` when the response must be replaced
/// by the sanitised envelope.
fn report(logger: &AppLogger, error: &Error) -> bool {
    let Some(api_error) = error.as_error::<ApiError>() else {
        let mut fields = Fields::new();
        fields.insert("stack".to_owned(), json!(format!("{error:?}")));
        fields.insert("cause".to_owned(), Value::Null);
        logger.error(error.to_string(), fields);
        return true;
    };

    let Some(app_error) = api_error.app_error() else {
        let mut fields = Fields::new();
        let stack = api_error
            .stack()
            .map_or_else(|| format!("{api_error:?}"), ToString::to_string);
        fields.insert("stack".to_owned(), json!(stack));
        fields.insert(
            "cause".to_owned(),
            api_error
                .unexpected_cause()
                .map_or(Value::Null, |cause| json!(cause.to_string())),
        );
        logger.error(api_error.to_string(), fields);
        return false;
    };

    let mut fields = Fields::new();
    fields.insert("code".to_owned(), json!(app_error.code().as_str()));
    fields.insert("error_name".to_owned(), json!(app_error.code().name()));
    fields.insert("status".to_owned(), json!(app_error.status()));
    if let Some(metadata) = app_error.metadata() {
        fields.insert("metadata".to_owned(), Value::Object(metadata.clone()));
    }
    if app_error.status() >= 500 {
        fields.insert("stack".to_owned(), json!(format!("{app_error:?}")));
        fields.insert("cause".to_owned(), cause_chain(&app_error));
        logger.error(app_error.message(), fields);
    } else {
        logger.warn(app_error.message(), fields);
    }
    false
}

impl<S, B> Service<ServiceRequest> for ErrorBoundaryMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let request = req.request().clone();
        let service = Rc::clone(&self.service);
        let logger = self.logger.clone();
        Box::pin(async move {
            let res = match AssertUnwindSafe(service.call(req)).catch_unwind().await {
                Ok(Ok(res)) => res.map_into_boxed_body(),
                Ok(Err(error)) => ServiceResponse::from_err(error, request),
                Err(payload) => {
                    report_panic(&logger, payload.as_ref());
                    return Ok(ServiceResponse::new(request, internal_error_response()));
                }
            };

            let sanitise = res
                .response()
                .error()
                .is_some_and(|error| report(&logger, error));
            if !sanitise {
                return Ok(res);
            }
            let (request, _) = res.into_parts();
            Ok(ServiceResponse::new(request, internal_error_response()))
        })
    }
}
