//! Error taxonomy shared by domain logic and infrastructure.
//!
//! These errors are transport agnostic apart from the status number an
//! [`AppError`] carries. Inbound adapters serialise them into the uniform
//! client envelope.
//!
//! Codes are partitioned into disjoint numeric ranges by category:
//! system `1000..=1999`, domain `2000..=2999`, infrastructure `5000..=5999`.

use std::error::Error as StdError;
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Free-form structured data attached to an error and returned to clients.
pub type Metadata = Map<String, Value>;

/// Shared, cloneable handle to an underlying failure.
pub type ErrorCause = Arc<dyn StdError + Send + Sync + 'static>;

/// Category an [`ErrorCode`] belongs to, derived from its numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Generic failures: validation, authentication, authorisation, lookup.
    System,
    /// Failures raised inside a bounded context (users, credentials).
    Domain,
    /// Failures of backing services: data store, external services.
    Infrastructure,
}

impl ErrorCategory {
    /// Every category, in range order.
    pub const ALL: [Self; 3] = [Self::System, Self::Domain, Self::Infrastructure];

    /// Numeric range reserved for the category.
    #[must_use]
    pub const fn range(self) -> RangeInclusive<u16> {
        match self {
            Self::System => 1000..=1999,
            Self::Domain => 2000..=2999,
            Self::Infrastructure => 5000..=5999,
        }
    }

    /// Category owning `numeric`, if any.
    #[must_use]
    pub fn of(numeric: u16) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.range().contains(&numeric))
    }
}

/// Stable machine-readable error code.
///
/// Serialises as its numeric string (`"2000"`), which is the value clients
/// see in the error envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Unclassified failure.
    UnknownError,
    /// Input failed validation.
    ValidationError,
    /// Authentication missing or rejected.
    Unauthorized,
    /// Authenticated but not permitted.
    Forbidden,
    /// Generic resource lookup miss.
    NotFound,
    /// No user matches the lookup.
    UserNotFound,
    /// A user with the same identity already exists.
    UserAlreadyExists,
    /// Supplied credentials do not match.
    InvalidCredentials,
    /// The data store rejected or failed a request.
    DatabaseError,
    /// A downstream service failed.
    ExternalServiceError,
}

impl ErrorCode {
    /// Every defined code.
    pub const ALL: [Self; 10] = [
        Self::UnknownError,
        Self::ValidationError,
        Self::Unauthorized,
        Self::Forbidden,
        Self::NotFound,
        Self::UserNotFound,
        Self::UserAlreadyExists,
        Self::InvalidCredentials,
        Self::DatabaseError,
        Self::ExternalServiceError,
    ];

    /// Numeric value of the code.
    #[must_use]
    pub const fn numeric(self) -> u16 {
        match self {
            Self::UnknownError => 1000,
            Self::ValidationError => 1001,
            Self::Unauthorized => 1002,
            Self::Forbidden => 1003,
            Self::NotFound => 1004,
            Self::UserNotFound => 2000,
            Self::UserAlreadyExists => 2001,
            Self::InvalidCredentials => 2002,
            Self::DatabaseError => 5000,
            Self::ExternalServiceError => 5001,
        }
    }

    /// Wire representation sent to clients.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnknownError => "1000",
            Self::ValidationError => "1001",
            Self::Unauthorized => "1002",
            Self::Forbidden => "1003",
            Self::NotFound => "1004",
            Self::UserNotFound => "2000",
            Self::UserAlreadyExists => "2001",
            Self::InvalidCredentials => "2002",
            Self::DatabaseError => "5000",
            Self::ExternalServiceError => "5001",
        }
    }

    /// Symbolic name used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::UnknownError => "UNKNOWN_ERROR",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::UserAlreadyExists => "USER_ALREADY_EXISTS",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::ExternalServiceError => "EXTERNAL_SERVICE_ERROR",
        }
    }

    /// Category owning this code's numeric range.
    ///
    /// Every code is assigned inside exactly one range; the unit tests
    /// enforce that for each variant.
    #[must_use]
    pub fn category(self) -> ErrorCategory {
        ErrorCategory::of(self.numeric()).unwrap_or(ErrorCategory::System)
    }

    /// Parse the wire representation back into a code.
    #[must_use]
    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|candidate| candidate.as_str() == code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Business-meaningful failure raised by domain logic.
///
/// # Examples
/// ```
/// use auth_backend::domain::{DomainError, ErrorCode};
///
/// let err = DomainError::user_not_found("no user with that email");
/// assert_eq!(err.code(), ErrorCode::UserNotFound);
/// assert!(err.metadata().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct DomainError {
    code: ErrorCode,
    message: String,
    metadata: Option<Metadata>,
    cause: Option<ErrorCause>,
}

impl DomainError {
    /// Create a domain error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            metadata: None,
            cause: None,
        }
    }

    /// Attach client-visible metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Attach the underlying failure. Causes are logged, never serialised.
    #[must_use]
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.cause = Some(Arc::new(cause));
        self
    }

    /// Convenience constructor for [`ErrorCode::UserNotFound`].
    pub fn user_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UserNotFound, message)
    }

    /// Convenience constructor for [`ErrorCode::UserAlreadyExists`].
    pub fn user_already_exists(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UserAlreadyExists, message)
    }

    /// Convenience constructor for [`ErrorCode::InvalidCredentials`].
    pub fn invalid_credentials(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidCredentials, message)
    }

    /// Stable machine-readable error code.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Client-visible metadata.
    #[must_use]
    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    /// Underlying failure, if one was attached.
    #[must_use]
    pub fn cause(&self) -> Option<&ErrorCause> {
        self.cause.as_ref()
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for DomainError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn StdError + 'static))
    }
}

/// Infrastructure-level error carrying the transport status.
///
/// Built from a [`DomainError`] by [`to_app_error`](crate::domain::to_app_error)
/// or directly by infrastructure code.
///
/// # Examples
/// ```
/// use auth_backend::domain::{AppError, ErrorCode};
///
/// let err = AppError::database("connection pool exhausted");
/// assert_eq!(err.code(), ErrorCode::DatabaseError);
/// assert_eq!(err.status(), 500);
/// ```
#[derive(Debug, Clone)]
pub struct AppError {
    code: ErrorCode,
    status: u16,
    message: String,
    metadata: Option<Metadata>,
    cause: Option<ErrorCause>,
}

impl AppError {
    /// Create an application error with an explicit status.
    pub fn new(code: ErrorCode, status: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            status,
            message: message.into(),
            metadata: None,
            cause: None,
        }
    }

    /// Data store failure (`5000`, status 500).
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, 500, message)
    }

    /// Downstream service failure (`5001`, status 500).
    pub fn external_service(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ExternalServiceError, 500, message)
    }

    /// Attach client-visible metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Attach the underlying failure.
    #[must_use]
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.cause = Some(Arc::new(cause));
        self
    }

    pub(crate) fn with_shared_cause(mut self, cause: Option<ErrorCause>) -> Self {
        self.cause = cause;
        self
    }

    /// Stable machine-readable error code.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Transport status.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Client-visible metadata.
    #[must_use]
    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    /// Underlying failure, if one was attached.
    #[must_use]
    pub fn cause(&self) -> Option<&ErrorCause> {
        self.cause.as_ref()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for AppError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn StdError + 'static))
    }
}
