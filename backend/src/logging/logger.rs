//! Process-wide structured logger.

use std::fmt;
use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use mockable::{Clock, DefaultClock};
use serde_json::Value;
use tokio::sync::oneshot;

use super::writer::{self, Command, CommandSender};
use super::{Fields, LogLevel, LogRecord, LogSink};
use crate::domain::CorrelationContext;

struct LoggerCore {
    threshold: LogLevel,
    defaults: Arc<Fields>,
    clock: Arc<dyn Clock + Send + Sync>,
    sender: CommandSender,
    writer: Mutex<Option<JoinHandle<()>>>,
}

/// Structured logger shared by every component.
///
/// Constructed once at start-up with a fixed sink list. Cloning is cheap;
/// [`AppLogger::for_context`] derives a handle that stamps a component label
/// on each record. Every record is enriched with the ambient
/// [`CorrelationContext`] fields, overlaid by the fields passed at the call
/// site.
///
/// # Examples
/// ```
/// use auth_backend::logging::{AppLogger, LogLevel, fields};
/// use serde_json::json;
///
/// # fn main() -> std::io::Result<()> {
/// let logger = AppLogger::builder().threshold(LogLevel::Info).build()?;
/// let http = logger.for_context("HTTP");
/// http.info("Request completed", fields([("status_code", json!(200))]));
/// logger.shutdown();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AppLogger {
    core: Arc<LoggerCore>,
    context: Option<Arc<str>>,
}

impl fmt::Debug for AppLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppLogger")
            .field("threshold", &self.core.threshold)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl AppLogger {
    /// Start configuring a logger.
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::default()
    }

    /// Handle stamping `label` as the record context.
    #[must_use]
    pub fn for_context(&self, label: impl AsRef<str>) -> Self {
        Self {
            core: Arc::clone(&self.core),
            context: Some(Arc::from(label.as_ref())),
        }
    }

    /// Context label of this handle.
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Configured threshold.
    #[must_use]
    pub fn threshold(&self) -> LogLevel {
        self.core.threshold
    }

    /// Whether a record at `level` would be kept.
    #[must_use]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level.passes(self.core.threshold)
    }

    /// Emit a record.
    ///
    /// `context` overrides this handle's label for one call. Records below
    /// the threshold are dropped before anything is allocated for them.
    pub fn log(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        context: Option<&str>,
        fields: Fields,
    ) {
        if !self.enabled(level) {
            return;
        }
        let correlation = CorrelationContext::current()
            .map(|current| current.log_fields())
            .unwrap_or_default();
        let context = context
            .map(str::to_owned)
            .or_else(|| self.context.as_deref().map(str::to_owned));
        let record = LogRecord::new(
            level,
            message.into(),
            context,
            correlation,
            fields,
            Arc::clone(&self.core.defaults),
            self.core.clock.local(),
        );
        // A closed channel means the logger was shut down; nothing to report.
        let _ = self.core.sender.send(Command::Record(Box::new(record)));
    }

    /// Emit at [`LogLevel::Error`].
    pub fn error(&self, message: impl Into<String>, fields: Fields) {
        self.log(LogLevel::Error, message, None, fields);
    }

    /// Emit at [`LogLevel::Warn`].
    pub fn warn(&self, message: impl Into<String>, fields: Fields) {
        self.log(LogLevel::Warn, message, None, fields);
    }

    /// Emit at [`LogLevel::Info`].
    pub fn info(&self, message: impl Into<String>, fields: Fields) {
        self.log(LogLevel::Info, message, None, fields);
    }

    /// Emit at [`LogLevel::Http`].
    pub fn http(&self, message: impl Into<String>, fields: Fields) {
        self.log(LogLevel::Http, message, None, fields);
    }

    /// Emit at [`LogLevel::Debug`].
    pub fn debug(&self, message: impl Into<String>, fields: Fields) {
        self.log(LogLevel::Debug, message, None, fields);
    }

    /// Emit at [`LogLevel::Verbose`].
    pub fn verbose(&self, message: impl Into<String>, fields: Fields) {
        self.log(LogLevel::Verbose, message, None, fields);
    }

    /// Wait until every record queued before this call reached its sinks
    /// and the sinks were flushed.
    ///
    /// Not meant for the request path; used by tests and shutdown.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.core.sender.send(Command::Flush(done)).is_ok() {
            // An error means the writer exited; there is nothing left to flush.
            let _ = wait.await;
        }
    }

    /// Flush and close every sink, then join the writer thread.
    ///
    /// Later log calls are silently dropped. Calling this more than once is
    /// harmless.
    pub fn shutdown(&self) {
        let _ = self.core.sender.send(Command::Shutdown);
        let handle = self
            .core
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                eprintln!("log writer thread panicked");
            }
        }
    }
}

/// Builder for [`AppLogger`].
pub struct LoggerBuilder {
    threshold: LogLevel,
    defaults: Fields,
    clock: Arc<dyn Clock + Send + Sync>,
    sinks: Vec<Box<dyn LogSink>>,
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self {
            threshold: LogLevel::Info,
            defaults: Fields::new(),
            clock: Arc::new(DefaultClock),
            sinks: Vec::new(),
        }
    }
}

impl LoggerBuilder {
    /// Least severe level that is still recorded.
    #[must_use]
    pub fn threshold(mut self, threshold: LogLevel) -> Self {
        self.threshold = threshold;
        self
    }

    /// Field stamped on every record, e.g. `service`.
    #[must_use]
    pub fn default_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(key.into(), value.into());
        self
    }

    /// Clock used for record timestamps.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = clock;
        self
    }

    /// Append a sink.
    #[must_use]
    pub fn sink(mut self, sink: impl LogSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Append an already boxed sink.
    #[must_use]
    pub fn boxed_sink(mut self, sink: Box<dyn LogSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Start the writer thread and return the logger.
    ///
    /// # Errors
    /// Returns an error when the writer thread cannot be spawned.
    pub fn build(self) -> io::Result<AppLogger> {
        let (sender, handle) = writer::spawn(self.sinks)?;
        Ok(AppLogger {
            core: Arc::new(LoggerCore {
                threshold: self.threshold,
                defaults: Arc::new(self.defaults),
                clock: self.clock,
                sender,
                writer: Mutex::new(Some(handle)),
            }),
            context: None,
        })
    }
}
