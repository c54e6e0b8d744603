//! Pure mapping from domain error codes to transport statuses.

use super::error::{AppError, DomainError, ErrorCode};

/// Status used for any code without an explicit mapping.
pub const DEFAULT_STATUS: u16 = 500;

/// Transport status for `code`.
///
/// The table is total: codes without an entry fall back to
/// [`DEFAULT_STATUS`].
///
/// # Examples
/// ```
/// use auth_backend::domain::{status_for, ErrorCode};
///
/// assert_eq!(status_for(ErrorCode::UserNotFound), 404);
/// assert_eq!(status_for(ErrorCode::DatabaseError), 500);
/// ```
#[must_use]
pub const fn status_for(code: ErrorCode) -> u16 {
    match code {
        ErrorCode::ValidationError => 400,
        ErrorCode::Unauthorized | ErrorCode::InvalidCredentials => 401,
        ErrorCode::Forbidden => 403,
        ErrorCode::NotFound | ErrorCode::UserNotFound => 404,
        ErrorCode::UserAlreadyExists => 409,
        ErrorCode::UnknownError | ErrorCode::DatabaseError | ErrorCode::ExternalServiceError => {
            DEFAULT_STATUS
        }
    }
}

/// Lift a [`DomainError`] into an [`AppError`] with its mapped status.
///
/// Code, message and metadata are carried over verbatim and the cause is
/// shared rather than rewrapped.
#[must_use]
pub fn to_app_error(error: &DomainError) -> AppError {
    let app = AppError::new(error.code(), status_for(error.code()), error.message());
    let app = match error.metadata() {
        Some(metadata) => app.with_metadata(metadata.clone()),
        None => app,
    };
    app.with_shared_cause(error.cause().cloned())
}

impl From<DomainError> for AppError {
    fn from(error: DomainError) -> Self {
        to_app_error(&error)
    }
}
