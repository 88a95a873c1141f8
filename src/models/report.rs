// Summaries and per-request reports handed to rendering

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ClassifiedBucket, Segment};

/// Totals over one segment sequence. Seconds are whole seconds; downtime is
/// always derived as `total - operational - unknown`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub equipment_group: Option<String>,
    pub total_window_seconds: i64,
    pub operational_seconds: i64,
    pub downtime_seconds: i64,
    pub unknown_seconds: i64,
    pub cycle_estimate: Option<f64>,
    /// Operational share of the window in percent (0 for an empty window).
    pub operational_percent: f64,
    /// `H:MM` renderings of operational time and downtime.
    pub operational_display: String,
    pub downtime_display: String,
}

/// Samples the normalizer dropped, by reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub malformed_timestamps: usize,
    pub out_of_window: usize,
    /// Alarm labels with no equipment-group mapping, sorted and deduplicated.
    pub unmapped_labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub bucket_width_secs: i64,
}

/// Timeline of one equipment group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTimeline {
    pub equipment_group: String,
    pub buckets: Vec<ClassifiedBucket>,
    pub segments: Vec<Segment>,
    pub summary: Summary,
}

/// Result of one cycle or alarm aggregation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineReport {
    pub window: WindowInfo,
    /// One entry per equipment group, ordered by group name.
    pub groups: Vec<GroupTimeline>,
    pub diagnostics: Diagnostics,
}

impl TimelineReport {
    pub fn group(&self, name: &str) -> Option<&GroupTimeline> {
        self.groups.iter().find(|g| g.equipment_group == name)
    }
}

/// Outcome of one aggregation request. `NoData` is distinct from a report
/// whose summary happens to be all zeros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Report {
    Ok(TimelineReport),
    NoData {
        reason: String,
        diagnostics: Diagnostics,
    },
}

impl Report {
    pub fn no_data(reason: impl Into<String>) -> Self {
        Report::NoData {
            reason: reason.into(),
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Report::NoData { .. })
    }

    pub fn ok(self) -> Option<TimelineReport> {
        match self {
            Report::Ok(t) => Some(t),
            Report::NoData { .. } => None,
        }
    }
}
