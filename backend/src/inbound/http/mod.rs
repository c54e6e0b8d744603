//! HTTP inbound adapter: the health endpoint plus the request correlation
//! and error boundary middleware every route runs behind.

pub mod app;
pub mod boundary;
pub mod cache_control;
pub mod correlation;
pub mod error;
pub mod health;
pub mod state;

pub use app::{AppDependencies, build_app};
pub use boundary::ErrorBoundary;
pub use correlation::RequestCorrelation;
pub use error::{ApiError, ApiResult, ErrorBody, ErrorEnvelope};
