//! Auth backend library modules.
//!
//! The business side of the service is still to come; what lives here is the
//! observability core every request runs through: correlation context,
//! structured logging, the error taxonomy and its HTTP envelope, and the
//! dependency health check.

pub mod domain;
pub mod inbound;
pub mod logging;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
