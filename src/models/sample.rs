// Raw rows from a data source and their normalized form

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp as delivered by a source: ISO-8601 text or an integer epoch.
/// The epoch unit is not carried here; it belongs to the source configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Epoch(i64),
    Text(String),
}

/// One untrusted row from a data source. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    #[serde(default)]
    pub timestamp: Option<RawTimestamp>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub equipment_group: Option<String>,
    #[serde(default)]
    pub alarm_label: Option<String>,
}

impl RawSample {
    pub fn metric(timestamp: RawTimestamp, value: Option<f64>) -> Self {
        Self {
            timestamp: Some(timestamp),
            value,
            equipment_group: None,
            alarm_label: None,
        }
    }

    /// Alarm row; `duration_secs` of `None` means the source gave no duration.
    pub fn alarm(timestamp: RawTimestamp, label: &str, duration_secs: Option<f64>) -> Self {
        Self {
            timestamp: Some(timestamp),
            value: duration_secs,
            equipment_group: None,
            alarm_label: Some(label.to_string()),
        }
    }

    /// A row is an alarm when it carries a non-empty alarm label.
    pub fn is_alarm(&self) -> bool {
        self.alarm_label
            .as_deref()
            .is_some_and(|l| !l.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleKind {
    Metric,
    Alarm,
}

/// Canonical sample. `value` is the scaled metric (never null for metrics) or
/// the alarm duration in seconds (null when the source gave none).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedSample {
    pub instant: DateTime<Utc>,
    pub equipment_group: String,
    pub kind: SampleKind,
    pub value: Option<f64>,
    pub label: Option<String>,
}
