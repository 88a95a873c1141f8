// Bucketizer: maps samples onto the window's bucket grid and reduces each bucket.
// Pure and deterministic; no wall clock involved.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{BucketAggregate, NormalizedSample, SampleKind};
use crate::window::BucketGrid;

/// Key: (equipment group, bucket index).
pub type BucketKey = (String, usize);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bucketed {
    pub aggregates: BTreeMap<BucketKey, BucketAggregate>,
}

impl Bucketed {
    /// Equipment groups with at least one populated bucket, in order.
    pub fn groups(&self) -> Vec<String> {
        let set: BTreeSet<&String> = self.aggregates.keys().map(|(g, _)| g).collect();
        set.into_iter().cloned().collect()
    }

    pub fn get(&self, group: &str, index: usize) -> Option<&BucketAggregate> {
        self.aggregates.get(&(group.to_string(), index))
    }
}

#[derive(Default)]
struct MetricAcc {
    sum: f64,
    n: usize,
}

#[derive(Default)]
struct AlarmAcc {
    duration: Option<f64>,
    events: usize,
    causes: BTreeSet<String>,
}

/// Reduces samples of `kind` per (group, bucket): mean for metrics; summed
/// known duration, event count and deduplicated causes for alarms. Samples
/// outside the grid (alarms raised before the window) are skipped.
pub fn bucketize(samples: &[NormalizedSample], grid: &BucketGrid, kind: SampleKind) -> Bucketed {
    let mut ordered: Vec<&NormalizedSample> = samples.iter().filter(|s| s.kind == kind).collect();
    ordered.sort_by(|a, b| {
        a.instant
            .cmp(&b.instant)
            .then_with(|| a.equipment_group.cmp(&b.equipment_group))
    });

    let mut metrics: BTreeMap<BucketKey, MetricAcc> = BTreeMap::new();
    let mut alarms: BTreeMap<BucketKey, AlarmAcc> = BTreeMap::new();

    for s in ordered {
        let Some(idx) = grid.index_of(s.instant) else {
            continue;
        };
        let key = (s.equipment_group.clone(), idx);
        match kind {
            SampleKind::Metric => {
                let acc = metrics.entry(key).or_default();
                acc.sum += s.value.unwrap_or(0.0);
                acc.n += 1;
            }
            SampleKind::Alarm => {
                let acc = alarms.entry(key).or_default();
                acc.events += 1;
                if let Some(d) = s.value {
                    acc.duration = Some(acc.duration.unwrap_or(0.0) + d);
                }
                if let Some(label) = &s.label {
                    acc.causes.insert(label.clone());
                }
            }
        }
    }

    let mut aggregates = BTreeMap::new();
    for (key, acc) in metrics {
        aggregates.insert(
            key,
            BucketAggregate::Metric {
                mean: acc.sum / acc.n as f64,
                samples: acc.n,
            },
        );
    }
    for (key, acc) in alarms {
        aggregates.insert(
            key,
            BucketAggregate::Alarm {
                total_duration_secs: acc.duration,
                events: acc.events,
                causes: acc.causes.into_iter().collect(),
            },
        );
    }

    Bucketed { aggregates }
}
