// Bucketizer and bucket-grid tests

mod common;

use chrono::{DateTime, Duration, Utc};
use common::*;
use shiftline::models::{BucketAggregate, NormalizedSample, SampleKind};
use shiftline::timeline::bucketizer::bucketize;
use shiftline::window::BucketGrid;

fn sample(instant: DateTime<Utc>, group: &str, value: f64) -> NormalizedSample {
    NormalizedSample {
        instant,
        equipment_group: group.into(),
        kind: SampleKind::Metric,
        value: Some(value),
        label: None,
    }
}

fn alarm_sample(instant: DateTime<Utc>, label: &str, duration: Option<f64>) -> NormalizedSample {
    NormalizedSample {
        instant,
        equipment_group: "Press-1".into(),
        kind: SampleKind::Alarm,
        value: duration,
        label: Some(label.into()),
    }
}

#[test]
fn test_grid_counts_and_index() {
    let grid = BucketGrid::new(window((7, 0), (17, 0)), Duration::minutes(15)).unwrap();
    assert_eq!(grid.count(), 40);
    assert_eq!(grid.index_of(at(7, 0)), Some(0));
    assert_eq!(grid.index_of(at(7, 14)), Some(0));
    assert_eq!(grid.index_of(at(7, 15)), Some(1));
    assert_eq!(grid.index_of(at(16, 59)), Some(39));
    assert_eq!(grid.index_of(at(17, 0)), None);
    assert_eq!(grid.index_of(at(6, 59)), None);
}

#[test]
fn test_grid_truncates_last_bucket_at_window_end() {
    let grid = BucketGrid::new(window((7, 0), (7, 50)), Duration::minutes(15)).unwrap();
    assert_eq!(grid.count(), 4);
    assert_eq!(grid.bounds(3), (at(7, 45), at(7, 50)));
    assert_eq!(grid.bounds(1), (at(7, 15), at(7, 30)));
}

#[test]
fn test_grid_rejects_non_positive_width() {
    assert!(BucketGrid::new(window((7, 0), (8, 0)), Duration::zero()).is_none());
}

#[test]
fn test_bucketize_means_per_group_and_bucket() {
    let grid = BucketGrid::new(window((7, 0), (7, 3)), Duration::minutes(1)).unwrap();
    let samples = vec![
        sample(at(7, 0), "Press", 1.0),
        sample(at(7, 0) + Duration::seconds(30), "Press", 3.0),
        sample(at(7, 2), "Press", 5.0),
        sample(at(7, 0), "Saw", 10.0),
    ];
    let out = bucketize(&samples, &grid, SampleKind::Metric);
    assert_eq!(
        out.get("Press", 0),
        Some(&BucketAggregate::Metric {
            mean: 2.0,
            samples: 2
        })
    );
    assert!(out.get("Press", 1).is_none());
    assert_eq!(
        out.get("Saw", 0),
        Some(&BucketAggregate::Metric {
            mean: 10.0,
            samples: 1
        })
    );
    assert_eq!(out.groups(), vec!["Press", "Saw"]);
}

#[test]
fn test_bucketize_drops_samples_outside_grid() {
    let grid = BucketGrid::new(window((7, 0), (7, 3)), Duration::minutes(1)).unwrap();
    let samples = vec![sample(at(6, 59), "Press", 1.0), sample(at(7, 3), "Press", 1.0)];
    let out = bucketize(&samples, &grid, SampleKind::Metric);
    assert!(out.aggregates.is_empty());
}

#[test]
fn test_bucketize_alarms_sums_known_durations_and_dedups_causes() {
    let grid = BucketGrid::new(window((7, 0), (9, 0)), Duration::hours(1)).unwrap();
    let samples = vec![
        alarm_sample(at(7, 5), "E-Stop", Some(60.0)),
        alarm_sample(at(7, 10), "E-Stop", None),
        alarm_sample(at(7, 20), "Guard", Some(30.0)),
        alarm_sample(at(8, 0), "Guard", None),
    ];
    let out = bucketize(&samples, &grid, SampleKind::Alarm);
    assert_eq!(
        out.get("Press-1", 0),
        Some(&BucketAggregate::Alarm {
            total_duration_secs: Some(90.0),
            events: 3,
            causes: vec!["E-Stop".into(), "Guard".into()],
        })
    );
    assert_eq!(
        out.get("Press-1", 1),
        Some(&BucketAggregate::Alarm {
            total_duration_secs: None,
            events: 1,
            causes: vec!["Guard".into()],
        })
    );
}

#[test]
fn test_bucketize_ignores_other_kind() {
    let grid = BucketGrid::new(window((7, 0), (8, 0)), Duration::hours(1)).unwrap();
    let samples = vec![alarm_sample(at(7, 5), "E-Stop", Some(60.0))];
    assert!(bucketize(&samples, &grid, SampleKind::Metric).aggregates.is_empty());
}
