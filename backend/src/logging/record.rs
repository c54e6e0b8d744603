//! Immutable log records and their JSON encoding.

use std::sync::Arc;

use chrono::{DateTime, Local};
use serde_json::{Map, Value};

use super::LogLevel;

/// Structured key/value payload attached to a record.
pub type Fields = Map<String, Value>;

/// Timestamp layout shared by every sink.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const RESERVED_KEYS: [&str; 4] = ["timestamp", "level", "message", "context"];

/// Build a [`Fields`] map from literal pairs.
///
/// # Examples
/// ```
/// use auth_backend::logging::fields;
/// use serde_json::json;
///
/// let extra = fields([("status_code", json!(200)), ("route", json!("/health"))]);
/// assert_eq!(extra.len(), 2);
/// ```
#[must_use]
pub fn fields<const N: usize>(pairs: [(&str, Value); N]) -> Fields {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_owned(), value))
        .collect()
}

/// One log entry, produced once and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct LogRecord {
    level: LogLevel,
    message: String,
    context: Option<String>,
    correlation: Fields,
    extra: Fields,
    defaults: Arc<Fields>,
    timestamp: DateTime<Local>,
}

impl LogRecord {
    /// Assemble a record. Callers normally go through
    /// [`AppLogger`](super::AppLogger) instead.
    #[must_use]
    pub fn new(
        level: LogLevel,
        message: String,
        context: Option<String>,
        correlation: Fields,
        extra: Fields,
        defaults: Arc<Fields>,
        timestamp: DateTime<Local>,
    ) -> Self {
        Self {
            level,
            message,
            context,
            correlation,
            extra,
            defaults,
            timestamp,
        }
    }

    /// Severity.
    #[must_use]
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Message text.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Component label, e.g. `HTTP`.
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Fields taken from the ambient correlation context.
    #[must_use]
    pub fn correlation(&self) -> &Fields {
        &self.correlation
    }

    /// Fields passed explicitly by the caller.
    #[must_use]
    pub fn extra(&self) -> &Fields {
        &self.extra
    }

    /// Process-wide default fields (`service`, `environment`).
    #[must_use]
    pub fn defaults(&self) -> &Fields {
        &self.defaults
    }

    /// Creation time.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    /// Correlation fields overlaid with explicit fields; explicit wins.
    #[must_use]
    pub fn merged_fields(&self) -> Fields {
        let mut merged = self.correlation.clone();
        merged.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }

    /// Look up a merged field by key.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key).or_else(|| self.correlation.get(key))
    }

    /// Machine-parsable encoding used by durable sinks.
    ///
    /// Reserved keys (`timestamp`, `level`, `message`, `context`) always
    /// reflect the record itself; caller fields cannot shadow them.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut object = (*self.defaults).clone();
        for (key, value) in self.merged_fields() {
            if !RESERVED_KEYS.contains(&key.as_str()) {
                object.insert(key, value);
            }
        }
        object.insert(
            "timestamp".to_owned(),
            Value::from(self.timestamp.format(TIMESTAMP_FORMAT).to_string()),
        );
        object.insert("level".to_owned(), Value::from(self.level.as_str()));
        object.insert("message".to_owned(), Value::from(self.message.as_str()));
        if let Some(context) = &self.context {
            object.insert("context".to_owned(), Value::from(context.as_str()));
        }
        Value::Object(object)
    }
}
