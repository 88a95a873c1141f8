// State classifier: threshold policy for cycle metrics, alarm-presence policy
// for alarm events, and the alarm label -> equipment group table.

use std::collections::{BTreeMap, HashMap};

use chrono::Duration;

use super::bucketizer::Bucketed;
use crate::error::SampleError;
use crate::models::{
    AlarmInterval, BucketAggregate, BucketState, ClassifiedBucket, NormalizedSample, SampleKind,
};
use crate::window::BucketGrid;

/// Maps raw alarm labels to logical equipment groups. Lookups are exact after
/// trimming; there is no fallback group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlarmGroupTable {
    map: BTreeMap<String, String>,
}

impl AlarmGroupTable {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| {
                let (k, v): (String, String) = (k.into(), v.into());
                (k.trim().to_string(), v.trim().to_string())
            })
            .collect();
        Self { map }
    }

    pub fn from_map(map: &HashMap<String, String>) -> Self {
        Self::new(map.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    pub fn resolve(&self, label: &str) -> Result<&str, SampleError> {
        self.map
            .get(label.trim())
            .map(String::as_str)
            .ok_or_else(|| SampleError::UnmappedAlarmLabel(label.trim().to_string()))
    }

    /// Distinct equipment groups named by the table, in order.
    pub fn groups(&self) -> Vec<String> {
        let mut groups: Vec<String> = self.map.values().cloned().collect();
        groups.sort();
        groups.dedup();
        groups
    }
}

/// Operational iff the bucket mean is strictly above `threshold`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdPolicy {
    pub threshold: f64,
}

impl ThresholdPolicy {
    pub fn classify(&self, aggregate: Option<&BucketAggregate>) -> BucketState {
        match aggregate {
            Some(BucketAggregate::Metric { mean, .. }) if *mean > self.threshold => {
                BucketState::Operational
            }
            Some(BucketAggregate::Metric { .. }) => BucketState::Idle,
            Some(BucketAggregate::Alarm { .. }) | None => BucketState::NoData,
        }
    }

    /// Classifies every bucket of the grid for `group`.
    pub fn classify_all(
        &self,
        bucketed: &Bucketed,
        grid: &BucketGrid,
        group: &str,
    ) -> Vec<ClassifiedBucket> {
        (0..grid.count())
            .map(|index| {
                let aggregate = bucketed.get(group, index);
                let (start, end) = grid.bounds(index);
                ClassifiedBucket {
                    index,
                    start,
                    end,
                    state: self.classify(aggregate),
                    aggregate: aggregate.cloned(),
                }
            })
            .collect()
    }
}

/// Time covered by each alarm event, per equipment group. An event with a
/// known duration covers `[instant, instant + duration)`, cut at the window
/// end; one without covers the rest of the bucket it was raised in. Empty
/// intervals are left out, so a zero-length alarm faults nothing.
pub fn alarm_intervals(
    samples: &[NormalizedSample],
    grid: &BucketGrid,
) -> BTreeMap<String, Vec<AlarmInterval>> {
    let mut out: BTreeMap<String, Vec<AlarmInterval>> = BTreeMap::new();
    for s in samples.iter().filter(|s| s.kind == SampleKind::Alarm) {
        let end = match s.value {
            Some(secs) => {
                let remaining = (grid.window.end - s.instant).num_milliseconds();
                let ms = (secs * 1000.0).round().min(remaining as f64);
                s.instant + Duration::milliseconds(ms as i64)
            }
            None => match grid.index_of(s.instant) {
                Some(idx) => grid.bounds(idx).1,
                None => continue,
            },
        };
        if end <= s.instant || end <= grid.window.start {
            continue;
        }
        out.entry(s.equipment_group.clone())
            .or_default()
            .push(AlarmInterval {
                start: s.instant,
                end,
                label: s.label.clone().unwrap_or_default(),
            });
    }
    out
}

/// Fault iff any of the group's alarm intervals overlaps the bucket. Buckets
/// carry the aggregate of events raised inside them, when there were any.
pub fn classify_alarm_presence(
    bucketed: &Bucketed,
    intervals: &[AlarmInterval],
    grid: &BucketGrid,
    group: &str,
) -> Vec<ClassifiedBucket> {
    (0..grid.count())
        .map(|index| {
            let (start, end) = grid.bounds(index);
            let active = intervals.iter().any(|iv| iv.start < end && iv.end > start);
            ClassifiedBucket {
                index,
                start,
                end,
                state: if active {
                    BucketState::Fault
                } else {
                    BucketState::Operational
                },
                aggregate: bucketed.get(group, index).cloned(),
            }
        })
        .collect()
}
