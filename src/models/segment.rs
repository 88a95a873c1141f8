// Timeline segments and the alarm intervals they are built from

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::BucketState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentState {
    Operational,
    Idle,
    Fault,
    NoData,
}

impl From<BucketState> for SegmentState {
    fn from(s: BucketState) -> Self {
        match s {
            BucketState::Operational => SegmentState::Operational,
            BucketState::Idle => SegmentState::Idle,
            BucketState::Fault => SegmentState::Fault,
            BucketState::NoData => SegmentState::NoData,
        }
    }
}

/// Half-open alarm interval `[start, end)` for one equipment group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub label: String,
}

/// Maximal span `[start, end)` with a single state for one equipment group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub equipment_group: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_seconds: f64,
    pub state: SegmentState,
    /// Fault causes in first-contribution order; empty for other states.
    pub causes: Vec<String>,
}

impl Segment {
    pub fn new(
        equipment_group: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        state: SegmentState,
        causes: Vec<String>,
    ) -> Self {
        Self {
            equipment_group: equipment_group.to_string(),
            start,
            end,
            duration_seconds: (end - start).num_milliseconds() as f64 / 1000.0,
            state,
            causes,
        }
    }

    pub fn duration_ms(&self) -> i64 {
        (self.end - self.start).num_milliseconds()
    }
}
