// Fixed-width time buckets and their aggregates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reduction of every sample that fell into a bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BucketAggregate {
    Metric {
        mean: f64,
        samples: usize,
    },
    Alarm {
        /// Sum of known durations; `None` when no event in the bucket had one.
        total_duration_secs: Option<f64>,
        events: usize,
        /// Deduplicated labels, lexicographic.
        causes: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketState {
    Operational,
    Idle,
    Fault,
    NoData,
}

/// A bucket with its classification, as handed to rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedBucket {
    pub index: usize,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub state: BucketState,
    pub aggregate: Option<BucketAggregate>,
}
