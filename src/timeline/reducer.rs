// Summary reducer: segment sequence -> operational / downtime / unknown totals.

use crate::models::{Segment, SegmentState, Summary};
use crate::window::WorkingWindow;

fn sum_ms(segments: &[Segment], state: SegmentState) -> i64 {
    segments
        .iter()
        .filter(|s| s.state == state)
        .map(Segment::duration_ms)
        .sum()
}

/// Rolls `segments` into a Summary over `window`.
///
/// Only operational and no-data time are summed; downtime is whatever is left
/// of the window, so `operational + downtime + unknown == total` holds exactly.
/// `avg_cycle_seconds` is given only for cycle data.
pub fn reduce(
    segments: &[Segment],
    window: &WorkingWindow,
    equipment_group: Option<&str>,
    avg_cycle_seconds: Option<f64>,
) -> Summary {
    let total = window.total_seconds().max(0);
    let operational = (sum_ms(segments, SegmentState::Operational) / 1000).clamp(0, total);
    let unknown = (sum_ms(segments, SegmentState::NoData) / 1000).clamp(0, total - operational);
    let downtime = total - operational - unknown;

    let cycle_estimate = avg_cycle_seconds
        .filter(|a| *a > 0.0)
        .map(|a| operational as f64 / a);
    let operational_percent = if total > 0 {
        operational as f64 * 100.0 / total as f64
    } else {
        0.0
    };

    Summary {
        equipment_group: equipment_group.map(str::to_string),
        total_window_seconds: total,
        operational_seconds: operational,
        downtime_seconds: downtime,
        unknown_seconds: unknown,
        cycle_estimate,
        operational_percent,
        operational_display: format_hours_minutes(operational),
        downtime_display: format_hours_minutes(downtime),
    }
}

/// `H:MM` with whole minutes, e.g. 9000 s -> "2:30".
pub fn format_hours_minutes(seconds: i64) -> String {
    let minutes = seconds.max(0) / 60;
    format!("{}:{:02}", minutes / 60, minutes % 60)
}
