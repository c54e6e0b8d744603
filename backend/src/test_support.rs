//! Test utilities for the backend crate.
//!
//! This module provides shared helpers for both unit tests (in `src/`) and
//! integration tests (in `tests/`). It is only compiled when running tests or
//! when the `test-support` feature is enabled.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use mockable::Clock;

use crate::domain::health::{HealthCheckResult, HealthIndicator};
use crate::logging::{AppLogger, LogLevel, LogRecord, LogSink, SinkFilter};

pub mod cap_fs {
    //! Capability-safe filesystem helpers for tests.
    //!
    //! The backend forbids direct `std::fs` calls. These helpers read log
    //! output through `cap_std::fs::Dir` so test suites share consistent,
    //! policy-compliant file access.

    use std::io;
    use std::path::Path;

    use cap_std::{ambient_authority, fs::Dir};

    /// Sorted file names inside `directory`.
    pub fn file_names(directory: &Path) -> io::Result<Vec<String>> {
        let dir = Dir::open_ambient_dir(directory, ambient_authority())?;
        let mut names = Vec::new();
        for entry in dir.entries()? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    /// Read a UTF-8 text file named `name` inside `directory`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use auth_backend::test_support::cap_fs::read_file_to_string;
    /// use cap_std::{ambient_authority, fs::Dir};
    ///
    /// let temp = tempfile::tempdir()?;
    /// Dir::open_ambient_dir(temp.path(), ambient_authority())?.write("combined.log", "hello\n")?;
    ///
    /// assert_eq!(read_file_to_string(temp.path(), "combined.log")?, "hello\n");
    /// # Ok::<(), std::io::Error>(())
    /// ```
    pub fn read_file_to_string(directory: &Path, name: &str) -> io::Result<String> {
        Dir::open_ambient_dir(directory, ambient_authority())?.read_to_string(name)
    }

    /// Parse every non-empty line of `name` as JSON.
    pub fn read_json_lines(directory: &Path, name: &str) -> io::Result<Vec<serde_json::Value>> {
        read_file_to_string(directory, name)?
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(io::Error::other))
            .collect()
    }
}

/// Records captured by a [`MemorySink`].
#[derive(Debug, Clone, Default)]
pub struct RecordedLogs(Arc<Mutex<Vec<LogRecord>>>);

impl RecordedLogs {
    fn lock(&self) -> MutexGuard<'_, Vec<LogRecord>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Every captured record, oldest first.
    pub fn records(&self) -> Vec<LogRecord> {
        self.lock().clone()
    }

    /// Captured messages, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.lock()
            .iter()
            .map(|record| record.message().to_owned())
            .collect()
    }

    /// Records at exactly `level`.
    pub fn at_level(&self, level: LogLevel) -> Vec<LogRecord> {
        self.lock()
            .iter()
            .filter(|record| record.level() == level)
            .cloned()
            .collect()
    }
}

/// Sink that keeps records in memory for assertions.
pub struct MemorySink {
    filter: SinkFilter,
    records: RecordedLogs,
}

impl MemorySink {
    /// Sink plus the handle tests read from.
    pub fn new(filter: SinkFilter) -> (Self, RecordedLogs) {
        let records = RecordedLogs::default();
        (
            Self {
                filter,
                records: records.clone(),
            },
            records,
        )
    }
}

impl LogSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn filter(&self) -> SinkFilter {
        self.filter
    }

    fn write(&mut self, record: &LogRecord) -> io::Result<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Logger writing only to a [`MemorySink`], tagged as the `auth-backend`
/// service.
///
/// # Panics
/// Panics when the writer thread cannot be spawned.
pub fn capturing_logger(threshold: LogLevel) -> (AppLogger, RecordedLogs) {
    let (sink, records) = MemorySink::new(SinkFilter::AtMost(LogLevel::Verbose));
    let logger = AppLogger::builder()
        .threshold(threshold)
        .default_field("service", "auth-backend")
        .default_field("environment", "test")
        .sink(sink)
        .build()
        .expect("capturing logger builds");
    (logger, records)
}

/// Clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(now)
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Indicator returning a canned verdict, optionally after a delay.
#[derive(Debug, Clone)]
pub struct StaticIndicator {
    up: bool,
    message: String,
    delay: Duration,
}

impl StaticIndicator {
    pub fn up(message: impl Into<String>) -> Self {
        Self {
            up: true,
            message: message.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn down(message: impl Into<String>) -> Self {
        Self {
            up: false,
            message: message.into(),
            delay: Duration::ZERO,
        }
    }

    /// Healthy, but only after sleeping for `delay`.
    pub fn delayed_up(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::up("slow but fine")
        }
    }
}

#[async_trait]
impl HealthIndicator for StaticIndicator {
    async fn is_healthy(&self, key: &str) -> HealthCheckResult {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.up {
            HealthCheckResult::up(key, self.message.clone())
        } else {
            HealthCheckResult::down(key, self.message.clone())
        }
    }
}
