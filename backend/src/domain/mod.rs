//! Domain primitives and services.
//!
//! Purpose: hold the transport-agnostic pieces of the backend. Request
//! correlation, the error taxonomy and its HTTP status table, the ports the
//! outbound adapters implement, and the health-check service all live here.
//!
//! Public surface:
//! - CorrelationContext and RequestId: per-request identity carried through
//!   async work.
//! - DomainError, AppError and ErrorCode: business and infrastructure
//!   failures with stable numeric codes.
//! - to_app_error and status_for: the single mapping from codes to statuses.
//! - health: indicators and their aggregation.

pub mod correlation;
pub mod error;
mod error_mapping;
pub mod health;
pub mod ports;

pub use self::correlation::{CorrelationContext, InboundRequest, REQUEST_ID_HEADER, RequestId};
pub use self::error::{
    AppError, DomainError, ErrorCategory, ErrorCause, ErrorCode, Metadata,
};
pub use self::error_mapping::{DEFAULT_STATUS, status_for, to_app_error};
