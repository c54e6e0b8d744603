//! Health verdicts and their aggregation.

use std::collections::BTreeMap;

use serde::Serialize;

/// Verdict of a single indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Dependency answered within limits.
    Up,
    /// Dependency failed, timed out or crossed its threshold.
    Down,
}

/// Result produced by exactly one indicator for one invocation.
///
/// Serialises as `{"status": "up", "message": "..."}`; the key is carried by
/// the enclosing map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthCheckResult {
    #[serde(skip)]
    key: String,
    status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl HealthCheckResult {
    /// Healthy verdict for `key`.
    pub fn up(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            status: HealthStatus::Up,
            message: Some(message.into()),
        }
    }

    /// Unhealthy verdict for `key`.
    pub fn down(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            status: HealthStatus::Down,
            message: Some(message.into()),
        }
    }

    /// Drop the message, leaving a bare status.
    #[must_use]
    pub fn without_message(mut self) -> Self {
        self.message = None;
        self
    }

    /// Report the verdict under `key`, whatever the indicator used.
    pub(crate) fn rekeyed(mut self, key: String) -> Self {
        self.key = key;
        self
    }

    /// Indicator key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Verdict.
    #[must_use]
    pub fn status(&self) -> HealthStatus {
        self.status
    }

    /// Whether the verdict is [`HealthStatus::Up`].
    #[must_use]
    pub fn is_up(&self) -> bool {
        self.status == HealthStatus::Up
    }

    /// Optional human-readable detail.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// Overall verdict of a health-check invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    /// Every indicator is up.
    Ok,
    /// At least one indicator is down.
    Error,
}

/// Combined report for one health-check invocation.
///
/// Maps are ordered by key so the serialised body is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateHealthReport {
    status: OverallStatus,
    info: BTreeMap<String, HealthCheckResult>,
    error: BTreeMap<String, HealthCheckResult>,
    details: BTreeMap<String, HealthCheckResult>,
}

impl AggregateHealthReport {
    /// Overall verdict.
    #[must_use]
    pub fn status(&self) -> OverallStatus {
        self.status
    }

    /// Whether every indicator is up.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == OverallStatus::Ok
    }

    /// Up entries.
    #[must_use]
    pub fn info(&self) -> &BTreeMap<String, HealthCheckResult> {
        &self.info
    }

    /// Down entries.
    #[must_use]
    pub fn error(&self) -> &BTreeMap<String, HealthCheckResult> {
        &self.error
    }

    /// Every entry.
    #[must_use]
    pub fn details(&self) -> &BTreeMap<String, HealthCheckResult> {
        &self.details
    }
}

/// Partition `results` into an [`AggregateHealthReport`].
///
/// # Examples
/// ```
/// use auth_backend::domain::health::{aggregate, HealthCheckResult, OverallStatus};
///
/// let report = aggregate(vec![
///     HealthCheckResult::up("cache", "Cache is healthy"),
///     HealthCheckResult::down("database", "refused"),
/// ]);
/// assert_eq!(report.status(), OverallStatus::Error);
/// assert_eq!(report.details().len(), 2);
/// assert!(report.error().contains_key("database"));
/// ```
#[must_use]
pub fn aggregate(results: impl IntoIterator<Item = HealthCheckResult>) -> AggregateHealthReport {
    let mut info = BTreeMap::new();
    let mut error = BTreeMap::new();
    let mut details = BTreeMap::new();

    for result in results {
        let key = result.key.clone();
        match result.status {
            HealthStatus::Up => info.insert(key.clone(), result.clone()),
            HealthStatus::Down => error.insert(key.clone(), result.clone()),
        };
        details.insert(key, result);
    }

    let status = if error.is_empty() {
        OverallStatus::Ok
    } else {
        OverallStatus::Error
    };

    AggregateHealthReport {
        status,
        info,
        error,
        details,
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    const KEYS: [&str; 4] = ["database", "cache", "disk", "memory"];

    fn results(down_mask: u8) -> Vec<HealthCheckResult> {
        KEYS.iter()
            .enumerate()
            .map(|(bit, key)| {
                if down_mask & (1 << bit) == 0 {
                    HealthCheckResult::up(*key, "fine")
                } else {
                    HealthCheckResult::down(*key, "broken")
                }
            })
            .collect()
    }

    #[rstest]
    fn aggregate_invariants_hold_for_every_combination() {
        for mask in 0_u8..16 {
            let input = results(mask);
            let all_up = input.iter().all(HealthCheckResult::is_up);
            let report = aggregate(input);

            assert_eq!(report.is_ok(), all_up, "mask {mask:04b}");
            assert_eq!(!report.error().is_empty(), !all_up);
            assert_eq!(report.details().len(), KEYS.len());
            assert_eq!(report.info().len() + report.error().len(), KEYS.len());
            assert!(report.info().values().all(HealthCheckResult::is_up));
            assert!(report.error().values().all(|r| !r.is_up()));
        }
    }

    #[rstest]
    fn empty_input_is_ok() {
        let report = aggregate(Vec::new());
        assert_eq!(report.status(), OverallStatus::Ok);
        assert!(report.details().is_empty());
    }

    #[rstest]
    fn report_serialises_without_keys_inside_entries() {
        let report = aggregate(vec![
            HealthCheckResult::up("cache", "Cache is healthy"),
            HealthCheckResult::down("disk", "Disk storage threshold exceeded").without_message(),
        ]);

        let body = serde_json::to_value(&report).expect("report serialises");

        assert_eq!(
            body,
            json!({
                "status": "error",
                "info": {"cache": {"status": "up", "message": "Cache is healthy"}},
                "error": {"disk": {"status": "down"}},
                "details": {
                    "cache": {"status": "up", "message": "Cache is healthy"},
                    "disk": {"status": "down"}
                }
            })
        );
    }
}
