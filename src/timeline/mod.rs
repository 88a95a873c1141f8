// Per-request pipelines: normalize -> bucketize -> classify -> merge -> reduce.
// Each stage returns a fresh collection; nothing is shared between requests.

pub mod bucketizer;
pub mod classifier;
pub mod merger;
pub mod normalizer;
pub mod reducer;

use chrono::Duration;
use tracing::{debug, instrument};

use crate::models::{GroupTimeline, RawSample, Report, SampleKind, TimelineReport};
use crate::window::{BucketGrid, WorkingWindow};
use classifier::{AlarmGroupTable, ThresholdPolicy};
use normalizer::NormalizerConfig;

/// Everything a cycle (press metric) aggregation needs.
#[derive(Debug, Clone)]
pub struct CycleSettings {
    pub window: WorkingWindow,
    pub bucket_width: Duration,
    pub normalizer: NormalizerConfig,
    pub threshold: f64,
    pub avg_cycle_seconds: f64,
}

/// Everything an alarm aggregation needs.
#[derive(Debug, Clone)]
pub struct AlarmSettings {
    pub window: WorkingWindow,
    pub bucket_width: Duration,
    pub normalizer: NormalizerConfig,
    pub groups: AlarmGroupTable,
}

const NO_DATA_REASON: &str = "no data for window";

/// Threshold-classified timeline per metric group. Segments coalesce runs of
/// Operational, Idle and NoData buckets.
#[instrument(skip_all, fields(samples = raw.len()))]
pub fn cycle_report(raw: &[RawSample], settings: &CycleSettings) -> Report {
    let Some(grid) = BucketGrid::new(settings.window, settings.bucket_width) else {
        return Report::no_data("bucket width must be positive");
    };
    let metrics_only: Vec<RawSample> = raw.iter().filter(|r| !r.is_alarm()).cloned().collect();
    let normalized = normalizer::normalize(
        &metrics_only,
        &settings.window,
        &settings.normalizer,
        &AlarmGroupTable::default(),
    );
    if normalized.samples.is_empty() {
        return Report::NoData {
            reason: NO_DATA_REASON.to_string(),
            diagnostics: normalized.diagnostics,
        };
    }

    let bucketed = bucketizer::bucketize(&normalized.samples, &grid, SampleKind::Metric);
    let policy = ThresholdPolicy {
        threshold: settings.threshold,
    };
    let groups = bucketed
        .groups()
        .into_iter()
        .map(|group| {
            let buckets = policy.classify_all(&bucketed, &grid, &group);
            let segments = merger::segments_from_buckets(&group, &buckets);
            let summary = reducer::reduce(
                &segments,
                &settings.window,
                Some(&group),
                Some(settings.avg_cycle_seconds),
            );
            GroupTimeline {
                equipment_group: group,
                buckets,
                segments,
                summary,
            }
        })
        .collect::<Vec<_>>();
    debug!(groups = groups.len(), "cycle report built");

    Report::Ok(TimelineReport {
        window: grid.info(),
        groups,
        diagnostics: normalized.diagnostics,
    })
}

/// Exact-interval fault timeline per equipment group. Every group named by the
/// lookup table is reported; a group without alarms is Operational throughout.
#[instrument(skip_all, fields(samples = raw.len()))]
pub fn alarm_report(raw: &[RawSample], settings: &AlarmSettings) -> Report {
    let Some(grid) = BucketGrid::new(settings.window, settings.bucket_width) else {
        return Report::no_data("bucket width must be positive");
    };
    let alarms_only: Vec<RawSample> = raw.iter().filter(|r| r.is_alarm()).cloned().collect();
    let normalized = normalizer::normalize(
        &alarms_only,
        &settings.window,
        &settings.normalizer,
        &settings.groups,
    );
    if normalized.samples.is_empty() {
        return Report::NoData {
            reason: NO_DATA_REASON.to_string(),
            diagnostics: normalized.diagnostics,
        };
    }

    let bucketed = bucketizer::bucketize(&normalized.samples, &grid, SampleKind::Alarm);
    let mut intervals = classifier::alarm_intervals(&normalized.samples, &grid);
    let groups = settings
        .groups
        .groups()
        .into_iter()
        .map(|group| {
            let group_intervals = intervals.remove(&group).unwrap_or_default();
            let segments =
                merger::merge_alarm_intervals(&group, &group_intervals, &settings.window);
            let buckets =
                classifier::classify_alarm_presence(&bucketed, &group_intervals, &grid, &group);
            let summary = reducer::reduce(&segments, &settings.window, Some(&group), None);
            GroupTimeline {
                equipment_group: group,
                buckets,
                segments,
                summary,
            }
        })
        .collect::<Vec<_>>();
    debug!(groups = groups.len(), "alarm report built");

    Report::Ok(TimelineReport {
        window: grid.info(),
        groups,
        diagnostics: normalized.diagnostics,
    })
}
