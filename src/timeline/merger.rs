// Interval merger: turns possibly-overlapping alarm intervals (or a run of
// classified buckets) into an ordered partition of the working window.

use chrono::{DateTime, Utc};

use crate::models::{AlarmInterval, BucketAggregate, ClassifiedBucket, Segment, SegmentState};
use crate::window::WorkingWindow;

struct OpenFault {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    causes: Vec<String>,
}

impl OpenFault {
    fn add_cause(&mut self, label: &str) {
        if !self.causes.iter().any(|c| c == label) {
            self.causes.push(label.to_string());
        }
    }
}

/// Sweeps `intervals` for one equipment group and returns Operational/Fault
/// segments covering `[window.start, window.end)` with no gaps or overlaps.
///
/// Intervals are clipped to the window, sorted by start (ties broken by
/// label), and coalesced when they overlap or touch. Fault causes list each
/// contributing label once, in processing order.
pub fn merge_alarm_intervals(
    group: &str,
    intervals: &[AlarmInterval],
    window: &WorkingWindow,
) -> Vec<Segment> {
    let mut clipped: Vec<(DateTime<Utc>, DateTime<Utc>, &str)> = intervals
        .iter()
        .filter_map(|iv| {
            window
                .clip(iv.start, iv.end)
                .map(|(s, e)| (s, e, iv.label.as_str()))
        })
        .collect();
    clipped.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then_with(|| a.2.cmp(b.2))
            .then_with(|| a.1.cmp(&b.1))
    });

    let mut out = Vec::new();
    let mut pointer = window.start;
    let mut current: Option<OpenFault> = None;

    for (start, end, label) in clipped {
        if let Some(cur) = current.as_mut()
            && start <= cur.end
        {
            cur.end = cur.end.max(end);
            cur.add_cause(label);
            continue;
        }
        if let Some(done) = current.take() {
            out.push(Segment::new(
                group,
                done.start,
                done.end,
                SegmentState::Fault,
                done.causes,
            ));
            pointer = done.end;
        }
        if start > pointer {
            out.push(Segment::new(
                group,
                pointer,
                start,
                SegmentState::Operational,
                Vec::new(),
            ));
        }
        let mut open = OpenFault {
            start,
            end,
            causes: Vec::new(),
        };
        open.add_cause(label);
        current = Some(open);
    }

    if let Some(done) = current.take() {
        out.push(Segment::new(
            group,
            done.start,
            done.end,
            SegmentState::Fault,
            done.causes,
        ));
        pointer = done.end;
    }
    if pointer < window.end {
        out.push(Segment::new(
            group,
            pointer,
            window.end,
            SegmentState::Operational,
            Vec::new(),
        ));
    }
    out
}

/// Coalesces runs of equally-classified contiguous buckets into segments.
/// Fault segments collect the causes recorded in their buckets.
pub fn segments_from_buckets(group: &str, buckets: &[ClassifiedBucket]) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::new();
    for b in buckets {
        let state = SegmentState::from(b.state);
        let causes: Vec<String> = match (&b.aggregate, state) {
            (Some(BucketAggregate::Alarm { causes, .. }), SegmentState::Fault) => causes.clone(),
            _ => Vec::new(),
        };
        match out.last_mut() {
            Some(last) if last.state == state && last.end == b.start => {
                for c in causes {
                    if !last.causes.contains(&c) {
                        last.causes.push(c);
                    }
                }
                last.end = b.end;
                last.duration_seconds = last.duration_ms() as f64 / 1000.0;
            }
            _ => out.push(Segment::new(group, b.start, b.end, state, causes)),
        }
    }
    out
}

/// True when `segments` are ordered, non-empty, contiguous and exactly cover `window`.
pub fn is_partition(segments: &[Segment], window: &WorkingWindow) -> bool {
    let Some(first) = segments.first() else {
        return false;
    };
    if first.start != window.start {
        return false;
    }
    let mut prev_end = window.start;
    for s in segments {
        if s.start != prev_end || s.end <= s.start {
            return false;
        }
        prev_end = s.end;
    }
    prev_end == window.end
}
