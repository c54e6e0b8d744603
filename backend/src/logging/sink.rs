//! Sink abstraction shared by console and file destinations.

use std::io;

use super::{LogLevel, LogRecord};

/// Which levels a sink accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkFilter {
    /// Exactly one level (the durable error stream).
    Only(LogLevel),
    /// Every level at or above the given threshold.
    AtMost(LogLevel),
}

impl SinkFilter {
    /// Whether records at `level` go to the sink.
    #[must_use]
    pub fn accepts(self, level: LogLevel) -> bool {
        match self {
            Self::Only(only) => level == only,
            Self::AtMost(threshold) => level.passes(threshold),
        }
    }

    /// Least severe level this filter can accept.
    #[must_use]
    pub fn loosest(self) -> LogLevel {
        match self {
            Self::Only(level) | Self::AtMost(level) => level,
        }
    }
}

/// Destination for log records.
///
/// Sinks are owned and driven by the writer thread, so they only need to be
/// `Send`. Errors are reported by the writer and never reach callers of the
/// logger.
pub trait LogSink: Send {
    /// Short name used when reporting failures.
    fn name(&self) -> &str;

    /// Level filter for this sink.
    fn filter(&self) -> SinkFilter;

    /// Persist one record.
    fn write(&mut self, record: &LogRecord) -> io::Result<()>;

    /// Push buffered output to the underlying destination.
    fn flush(&mut self) -> io::Result<()>;

    /// Release resources; the default just flushes.
    fn close(&mut self) -> io::Result<()> {
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(SinkFilter::Only(LogLevel::Error), LogLevel::Error, true)]
    #[case(SinkFilter::Only(LogLevel::Error), LogLevel::Warn, false)]
    #[case(SinkFilter::AtMost(LogLevel::Info), LogLevel::Warn, true)]
    #[case(SinkFilter::AtMost(LogLevel::Info), LogLevel::Info, true)]
    #[case(SinkFilter::AtMost(LogLevel::Info), LogLevel::Http, false)]
    fn filters_levels(#[case] filter: SinkFilter, #[case] level: LogLevel, #[case] expected: bool) {
        assert_eq!(filter.accepts(level), expected);
    }
}
