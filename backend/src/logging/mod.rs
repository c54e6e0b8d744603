//! Structured, correlation-aware logging.
//!
//! [`AppLogger`] is built once at start-up with a fixed list of sinks and
//! handed to every component that logs. A dedicated writer thread owns the
//! sinks, so log calls never wait on I/O. Framework diagnostics emitted via
//! `tracing` are forwarded into the same sinks by [`AppLoggerLayer`].

mod bridge;
mod console;
mod level;
mod logger;
mod record;
mod rolling;
mod settings;
mod sink;
mod writer;

use std::io;
use std::sync::Arc;

use mockable::Clock;

pub use bridge::AppLoggerLayer;
pub use console::{ConsoleSink, format_line};
pub use level::{LogLevel, ParseLogLevelError};
pub use logger::{AppLogger, LoggerBuilder};
pub use record::{Fields, LogRecord, TIMESTAMP_FORMAT, fields};
pub use rolling::{RollingFileConfig, RollingFileSink};
pub use settings::LogSettings;
pub use sink::{LogSink, SinkFilter};

use crate::settings::ServiceSettings;

/// Prefix of the error-only durable stream.
pub const ERROR_STREAM: &str = "error";
/// Prefix of the all-levels durable stream.
pub const COMBINED_STREAM: &str = "combined";

/// Build the process logger: console on stdout plus, outside the test
/// environment, the `error` and `combined` rolling streams.
///
/// # Errors
/// Returns an error when the level is invalid, the log directory cannot be
/// opened or the writer thread cannot start.
pub fn build_logger(
    service: &ServiceSettings,
    settings: &LogSettings,
    clock: Arc<dyn Clock + Send + Sync>,
) -> io::Result<AppLogger> {
    let environment = service.environment;
    let threshold = settings.threshold(environment).map_err(io::Error::other)?;

    let mut builder = AppLogger::builder()
        .threshold(threshold)
        .clock(clock)
        .default_field("service", service.service_name.as_str())
        .default_field("environment", environment.as_str())
        .sink(ConsoleSink::stdout(threshold, settings.colour(environment)));

    if !environment.is_test() {
        let directory = settings.directory();
        builder = builder
            .sink(RollingFileSink::create(
                &directory,
                settings.rolling(ERROR_STREAM),
                SinkFilter::Only(LogLevel::Error),
            )?)
            .sink(RollingFileSink::create(
                &directory,
                settings.rolling(COMBINED_STREAM),
                SinkFilter::AtMost(threshold),
            )?);
    }

    builder.build()
}
