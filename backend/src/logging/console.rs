//! Human-readable console sink.
//!
//! Lines look like
//! `[2024-03-09 14:05:07] info    [HTTP] Request completed | status_code: 200 +3ms`.
//! The `service` and `environment` fields are omitted because they never vary
//! within one process.

use std::io::{self, Write};

use chrono::{DateTime, Local};
use colored::{Color, Colorize};
use serde_json::Value;

use super::record::TIMESTAMP_FORMAT;
use super::{LogLevel, LogRecord, LogSink, SinkFilter};

const NOISE_FIELDS: [&str; 2] = ["service", "environment"];

/// Console sink writing one line per record.
pub struct ConsoleSink<W: Write + Send> {
    out: W,
    filter: SinkFilter,
    colour: bool,
    previous: Option<DateTime<Local>>,
}

impl ConsoleSink<io::Stdout> {
    /// Console sink on standard output.
    #[must_use]
    pub fn stdout(threshold: LogLevel, colour: bool) -> Self {
        Self::new(io::stdout(), threshold, colour)
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    /// Console sink on an arbitrary writer.
    pub fn new(out: W, threshold: LogLevel, colour: bool) -> Self {
        Self {
            out,
            filter: SinkFilter::AtMost(threshold),
            colour,
            previous: None,
        }
    }

    /// Borrow the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.out
    }
}

fn level_colour(level: LogLevel) -> Color {
    match level {
        LogLevel::Error => Color::Red,
        LogLevel::Warn => Color::Yellow,
        LogLevel::Info => Color::Green,
        LogLevel::Http => Color::Magenta,
        LogLevel::Debug => Color::Blue,
        LogLevel::Verbose => Color::Cyan,
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Render `record` without styling; `elapsed_ms` is the gap since the
/// previous line.
#[must_use]
pub fn format_line(record: &LogRecord, elapsed_ms: i64) -> String {
    let mut line = format!(
        "[{}] {:<7} ",
        record.timestamp().format(TIMESTAMP_FORMAT),
        record.level()
    );
    if let Some(context) = record.context() {
        line.push('[');
        line.push_str(context);
        line.push_str("] ");
    }
    line.push_str(record.message());

    let meta = record
        .merged_fields()
        .into_iter()
        .filter(|(key, _)| !NOISE_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| format!("{key}: {}", render_value(&value)))
        .collect::<Vec<_>>();
    if !meta.is_empty() {
        line.push_str(" | ");
        line.push_str(&meta.join(", "));
    }

    line.push_str(&format!(" +{elapsed_ms}ms"));
    line
}

impl<W: Write + Send> LogSink for ConsoleSink<W> {
    fn name(&self) -> &str {
        "console"
    }

    fn filter(&self) -> SinkFilter {
        self.filter
    }

    fn write(&mut self, record: &LogRecord) -> io::Result<()> {
        let elapsed_ms = self
            .previous
            .map_or(0, |previous| (record.timestamp() - previous).num_milliseconds().max(0));
        self.previous = Some(record.timestamp());

        let line = format_line(record, elapsed_ms);
        if self.colour {
            writeln!(self.out, "{}", line.color(level_colour(record.level())))
        } else {
            writeln!(self.out, "{line}")
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
