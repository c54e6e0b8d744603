//! HTTP adapter mapping for domain and infrastructure errors.
//!
//! Purpose: keep the domain error types HTTP-agnostic while allowing Actix
//! handlers to turn failures into one JSON envelope,
//! `{"success": false, "error": {"code", "message", "metadata"?}}`.
//! Unclassified failures are masked: their detail is logged by the error
//! boundary and never serialised.

use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::io;
use std::sync::Arc;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::domain::{AppError, DomainError, ErrorCause, Metadata, to_app_error};

/// Code returned for failures outside the error taxonomy.
pub const INTERNAL_ERROR_CODE: &str = "INTERNAL_SERVER_ERROR";

/// Message returned for failures outside the error taxonomy.
pub const INTERNAL_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Client-visible failure payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// Envelope wrapping every failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: ErrorBody,
}

impl ErrorEnvelope {
    fn failure(error: ErrorBody) -> Self {
        Self {
            success: false,
            error,
        }
    }

    /// The generic envelope returned for unclassified failures.
    #[must_use]
    pub fn internal() -> Self {
        Self::failure(ErrorBody {
            code: INTERNAL_ERROR_CODE.to_owned(),
            message: INTERNAL_ERROR_MESSAGE.to_owned(),
            metadata: None,
        })
    }
}

impl From<&AppError> for ErrorEnvelope {
    fn from(error: &AppError) -> Self {
        Self::failure(ErrorBody {
            code: error.code().as_str().to_owned(),
            message: error.message().to_owned(),
            metadata: error.metadata().cloned(),
        })
    }
}

/// Error returned by HTTP handlers.
///
/// # Examples
/// ```
/// use actix_web::ResponseError;
/// use auth_backend::domain::DomainError;
/// use auth_backend::inbound::http::ApiError;
///
/// let err = ApiError::from(DomainError::user_not_found("missing"));
/// assert_eq!(err.status_code().as_u16(), 404);
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Business failure; mapped through the status table.
    #[error(transparent)]
    Domain(#[from] DomainError),
    /// Infrastructure failure that already carries its status.
    #[error(transparent)]
    App(#[from] AppError),
    /// Anything outside the taxonomy. Masked before it reaches the client.
    #[error("{error}")]
    Unexpected {
        error: ErrorCause,
        stack: Arc<Backtrace>,
    },
}

impl ApiError {
    /// Wrap an unclassified failure, capturing a backtrace for the logs.
    pub fn unexpected<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Unexpected {
            error: Arc::new(error),
            stack: Arc::new(Backtrace::force_capture()),
        }
    }

    /// [`unexpected`](Self::unexpected) for a bare message.
    pub fn unexpected_message(message: impl Into<String>) -> Self {
        Self::unexpected(io::Error::other(message.into()))
    }

    /// The classified form of this error, if it has one.
    #[must_use]
    pub fn app_error(&self) -> Option<AppError> {
        match self {
            Self::Domain(error) => Some(to_app_error(error)),
            Self::App(error) => Some(error.clone()),
            Self::Unexpected { .. } => None,
        }
    }

    /// Captured backtrace for unclassified failures.
    #[must_use]
    pub fn stack(&self) -> Option<&Backtrace> {
        match self {
            Self::Unexpected { stack, .. } => Some(stack),
            Self::Domain(_) | Self::App(_) => None,
        }
    }

    /// Underlying failure of an unclassified error.
    #[must_use]
    pub fn unexpected_cause(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Unexpected { error, .. } => error.source(),
            Self::Domain(_) | Self::App(_) => None,
        }
    }
}

pub(crate) fn status_from(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Sanitised response for failures outside the taxonomy.
#[must_use]
pub fn internal_error_response() -> HttpResponse {
    HttpResponse::InternalServerError().json(ErrorEnvelope::internal())
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.app_error()
            .map_or(StatusCode::INTERNAL_SERVER_ERROR, |error| {
                status_from(error.status())
            })
    }

    fn error_response(&self) -> HttpResponse {
        match self.app_error() {
            Some(error) => {
                HttpResponse::build(status_from(error.status())).json(ErrorEnvelope::from(&error))
            }
            None => internal_error_response(),
        }
    }
}
