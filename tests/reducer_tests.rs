// Summary reducer tests: derived downtime, unknown time, cycle estimate, H:MM

mod common;

use common::*;
use shiftline::models::{Segment, SegmentState};
use shiftline::timeline::reducer::{format_hours_minutes, reduce};

fn seg(from: (u32, u32), to: (u32, u32), state: SegmentState) -> Segment {
    Segment::new("Press", at(from.0, from.1), at(to.0, to.1), state, vec![])
}

#[test]
fn test_downtime_is_window_minus_operational() {
    let w = window((7, 0), (17, 0));
    let segs = vec![
        seg((7, 0), (9, 30), SegmentState::Operational),
        seg((9, 30), (10, 0), SegmentState::Fault),
        seg((10, 0), (17, 0), SegmentState::Operational),
    ];
    let s = reduce(&segs, &w, Some("Press"), None);
    assert_eq!(s.total_window_seconds, 36_000);
    assert_eq!(s.operational_seconds, 34_200);
    assert_eq!(s.downtime_seconds, 1_800);
    assert_eq!(s.unknown_seconds, 0);
    assert_eq!(s.operational_seconds + s.downtime_seconds, s.total_window_seconds);
    assert_eq!(s.operational_display, "9:30");
    assert_eq!(s.downtime_display, "0:30");
    assert_eq!(s.equipment_group.as_deref(), Some("Press"));
    assert_eq!(s.cycle_estimate, None);
}

#[test]
fn test_no_data_is_reported_separately_from_downtime() {
    let w = window((7, 0), (8, 0));
    let segs = vec![
        seg((7, 0), (7, 20), SegmentState::Operational),
        seg((7, 20), (7, 30), SegmentState::Idle),
        seg((7, 30), (8, 0), SegmentState::NoData),
    ];
    let s = reduce(&segs, &w, None, None);
    assert_eq!(s.operational_seconds, 1_200);
    assert_eq!(s.unknown_seconds, 1_800);
    assert_eq!(s.downtime_seconds, 600);
    assert_eq!(
        s.operational_seconds + s.downtime_seconds + s.unknown_seconds,
        s.total_window_seconds
    );
}

#[test]
fn test_operational_time_is_clamped_to_window() {
    let w = window((7, 0), (8, 0));
    // segments that overshoot the window (not produced by the merger, but tolerated)
    let segs = vec![seg((6, 0), (9, 0), SegmentState::Operational)];
    let s = reduce(&segs, &w, None, None);
    assert_eq!(s.operational_seconds, 3_600);
    assert_eq!(s.downtime_seconds, 0);
}

#[test]
fn test_cycle_estimate_uses_configured_average() {
    let w = window((7, 0), (8, 0));
    let segs = vec![
        seg((7, 0), (7, 45), SegmentState::Operational),
        seg((7, 45), (8, 0), SegmentState::Idle),
    ];
    let s = reduce(&segs, &w, None, Some(90.0));
    assert_eq!(s.cycle_estimate, Some(30.0));
    assert_eq!(s.operational_percent, 75.0);
}

#[test]
fn test_format_hours_minutes_truncates_to_minutes() {
    assert_eq!(format_hours_minutes(0), "0:00");
    assert_eq!(format_hours_minutes(59), "0:00");
    assert_eq!(format_hours_minutes(9_000), "2:30");
    assert_eq!(format_hours_minutes(36_000), "10:00");
}
