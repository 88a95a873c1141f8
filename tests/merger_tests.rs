// Interval merger tests: coalescing, tie-breaks, clipping, partition property

mod common;

use chrono::{DateTime, Duration, Utc};
use common::*;
use shiftline::models::{AlarmInterval, BucketState, ClassifiedBucket, SegmentState};
use shiftline::timeline::alarm_report;
use shiftline::timeline::merger::{is_partition, merge_alarm_intervals, segments_from_buckets};

fn iv(start: DateTime<Utc>, end: DateTime<Utc>, label: &str) -> AlarmInterval {
    AlarmInterval {
        start,
        end,
        label: label.into(),
    }
}

fn spans(segs: &[shiftline::models::Segment]) -> Vec<(DateTime<Utc>, DateTime<Utc>, SegmentState)> {
    segs.iter().map(|s| (s.start, s.end, s.state)).collect()
}

#[test]
fn test_single_alarm_splits_window_into_three() {
    let w = window((7, 0), (8, 0));
    let segs = merge_alarm_intervals("Press-1", &[iv(at(7, 10), at(7, 20), "E-Stop")], &w);
    assert_eq!(
        spans(&segs),
        vec![
            (at(7, 0), at(7, 10), SegmentState::Operational),
            (at(7, 10), at(7, 20), SegmentState::Fault),
            (at(7, 20), at(8, 0), SegmentState::Operational),
        ]
    );
    assert_eq!(segs[1].causes, vec!["E-Stop"]);
    assert_eq!(segs[1].duration_seconds, 600.0);
    assert!(segs.iter().all(|s| s.equipment_group == "Press-1"));
}

#[test]
fn test_overlapping_alarms_coalesce() {
    let w = window((9, 0), (11, 0));
    let segs = merge_alarm_intervals(
        "Press-1",
        &[
            iv(at(10, 3), at(10, 8), "Guard"),
            iv(at(10, 0), at(10, 5), "E-Stop"),
        ],
        &w,
    );
    let faults: Vec<_> = segs
        .iter()
        .filter(|s| s.state == SegmentState::Fault)
        .collect();
    assert_eq!(faults.len(), 1);
    assert_eq!((faults[0].start, faults[0].end), (at(10, 0), at(10, 8)));
    assert_eq!(faults[0].causes, vec!["E-Stop", "Guard"]);
    assert!(is_partition(&segs, &w));
}

#[test]
fn test_contained_and_touching_alarms_merge_into_one_fault() {
    let w = window((7, 0), (8, 0));
    let segs = merge_alarm_intervals(
        "Press-1",
        &[
            iv(at(7, 10), at(7, 30), "A"),
            iv(at(7, 12), at(7, 15), "B"),
            iv(at(7, 30), at(7, 40), "C"),
        ],
        &w,
    );
    assert_eq!(
        spans(&segs),
        vec![
            (at(7, 0), at(7, 10), SegmentState::Operational),
            (at(7, 10), at(7, 40), SegmentState::Fault),
            (at(7, 40), at(8, 0), SegmentState::Operational),
        ]
    );
    assert_eq!(segs[1].causes, vec!["A", "B", "C"]);
}

#[test]
fn test_simultaneous_starts_order_causes_by_label() {
    let w = window((7, 0), (8, 0));
    let segs = merge_alarm_intervals(
        "Press-1",
        &[
            iv(at(7, 10), at(7, 20), "Zeta"),
            iv(at(7, 10), at(7, 15), "Alpha"),
            iv(at(7, 10), at(7, 12), "Mid"),
        ],
        &w,
    );
    assert_eq!(segs[1].causes, vec!["Alpha", "Mid", "Zeta"]);
}

#[test]
fn test_alarms_are_clipped_to_window() {
    let w = window((7, 0), (8, 0));
    let segs = merge_alarm_intervals(
        "Press-1",
        &[
            iv(at(6, 30), at(7, 5), "Early"),
            iv(at(7, 55), at(8, 30), "Late"),
            iv(at(5, 0), at(6, 0), "Outside"),
        ],
        &w,
    );
    assert_eq!(
        spans(&segs),
        vec![
            (at(7, 0), at(7, 5), SegmentState::Fault),
            (at(7, 5), at(7, 55), SegmentState::Operational),
            (at(7, 55), at(8, 0), SegmentState::Fault),
        ]
    );
}

#[test]
fn test_alarm_raised_before_window_counts_from_window_start() {
    let w = window((7, 0), (8, 0));
    let raw = vec![
        alarm(6, 55, "E-Stop", Some(600.0)),
        alarm(7, 30, "E-Stop", Some(60.0)),
    ];
    let report = alarm_report(&raw, &alarm_settings(w, 3600, &[("E-Stop", "Press-1")]))
        .ok()
        .unwrap();
    let press = report.group("Press-1").unwrap();
    assert_eq!(
        spans(&press.segments),
        vec![
            (at(7, 0), at(7, 5), SegmentState::Fault),
            (at(7, 5), at(7, 30), SegmentState::Operational),
            (at(7, 30), at(7, 31), SegmentState::Fault),
            (at(7, 31), at(8, 0), SegmentState::Operational),
        ]
    );
    assert_eq!(press.summary.downtime_seconds, 360);
    assert_eq!(report.diagnostics.out_of_window, 0);
    assert_eq!(press.buckets[0].state, BucketState::Fault);
}

#[test]
fn test_zero_length_alarm_faults_nothing() {
    let w = window((7, 0), (8, 0));
    let raw = vec![alarm(7, 10, "E-Stop", Some(0.0))];
    let report = alarm_report(&raw, &alarm_settings(w, 3600, &[("E-Stop", "Press-1")]))
        .ok()
        .unwrap();
    let press = report.group("Press-1").unwrap();
    assert_eq!(spans(&press.segments), vec![(at(7, 0), at(8, 0), SegmentState::Operational)]);
    assert_eq!(press.buckets[0].state, BucketState::Operational);
    assert_eq!(press.summary.downtime_seconds, 0);
}

#[test]
fn test_no_alarms_is_one_operational_segment() {
    let w = window((7, 0), (17, 0));
    let segs = merge_alarm_intervals("Press-1", &[], &w);
    assert_eq!(spans(&segs), vec![(at(7, 0), at(17, 0), SegmentState::Operational)]);
}

#[test]
fn test_alarm_covering_whole_window_is_one_fault() {
    let w = window((7, 0), (8, 0));
    let segs = merge_alarm_intervals("Press-1", &[iv(at(6, 0), at(9, 0), "E-Stop")], &w);
    assert_eq!(spans(&segs), vec![(at(7, 0), at(8, 0), SegmentState::Fault)]);
}

#[test]
fn test_partition_holds_for_assorted_interval_sets() {
    let w = window((7, 0), (17, 0));
    let base = at(7, 0);
    // deterministic pseudo-random spread of intervals, some overlapping, some outside
    let mut intervals = Vec::new();
    let mut seed: i64 = 17;
    for i in 0..60 {
        seed = (seed * 1103 + 12345) % 9973;
        let start = base + Duration::minutes(seed % 700 - 60);
        let len = Duration::minutes(1 + (seed % 45));
        intervals.push(iv(start, start + len, &format!("L{}", i % 7)));
    }
    let segs = merge_alarm_intervals("Press-1", &intervals, &w);
    assert!(is_partition(&segs, &w));
    for pair in segs.windows(2) {
        assert_ne!(pair[0].state, pair[1].state, "adjacent segments must differ");
    }
    let total: f64 = segs.iter().map(|s| s.duration_seconds).sum();
    assert_eq!(total, 10.0 * 3600.0);
}

fn bucket(w_min: i64, index: usize, state: BucketState) -> ClassifiedBucket {
    let start = at(7, 0) + Duration::minutes(w_min * index as i64);
    ClassifiedBucket {
        index,
        start,
        end: start + Duration::minutes(w_min),
        state,
        aggregate: None,
    }
}

#[test]
fn test_buckets_coalesce_into_runs() {
    let buckets = vec![
        bucket(1, 0, BucketState::Operational),
        bucket(1, 1, BucketState::Operational),
        bucket(1, 2, BucketState::Idle),
        bucket(1, 3, BucketState::NoData),
        bucket(1, 4, BucketState::Operational),
    ];
    let segs = segments_from_buckets("Press", &buckets);
    assert_eq!(
        spans(&segs),
        vec![
            (at(7, 0), at(7, 2), SegmentState::Operational),
            (at(7, 2), at(7, 3), SegmentState::Idle),
            (at(7, 3), at(7, 4), SegmentState::NoData),
            (at(7, 4), at(7, 5), SegmentState::Operational),
        ]
    );
    assert_eq!(segs[0].duration_seconds, 120.0);
    assert!(is_partition(&segs, &window((7, 0), (7, 5))));
}

#[test]
fn test_is_partition_detects_gaps() {
    let w = window((7, 0), (7, 3));
    let segs = segments_from_buckets(
        "Press",
        &[
            bucket(1, 0, BucketState::Operational),
            bucket(1, 2, BucketState::Idle),
        ],
    );
    assert!(!is_partition(&segs, &w));
    assert!(!is_partition(&[], &w));
}
