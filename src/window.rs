// Working window (local clock-of-day bounds resolved to UTC) and its bucket grid.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::models::WindowInfo;

/// Half-open UTC interval `[start, end)` over which time is accounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkingWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl WorkingWindow {
    /// Returns None unless `start < end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// Window for `date` between local clock times `from` and `to` at a fixed UTC offset.
    pub fn for_date(
        date: NaiveDate,
        from: NaiveTime,
        to: NaiveTime,
        offset: FixedOffset,
    ) -> Option<Self> {
        let start = offset
            .from_local_datetime(&date.and_time(from))
            .single()?
            .with_timezone(&Utc);
        let end = offset
            .from_local_datetime(&date.and_time(to))
            .single()?
            .with_timezone(&Utc);
        Self::new(start, end)
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }

    pub fn total_ms(&self) -> i64 {
        (self.end - self.start).num_milliseconds()
    }

    pub fn total_seconds(&self) -> i64 {
        self.total_ms() / 1000
    }

    /// Clips `[start, end)` to the window; None if nothing is left.
    pub fn clip(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let s = start.max(self.start);
        let e = end.min(self.end);
        (s < e).then_some((s, e))
    }
}

/// Fixed-width buckets aligned to the window start. The last bucket is cut
/// short at the window end when the width does not divide the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketGrid {
    pub window: WorkingWindow,
    pub width: Duration,
}

impl BucketGrid {
    /// Returns None for a non-positive width.
    pub fn new(window: WorkingWindow, width: Duration) -> Option<Self> {
        (width > Duration::zero()).then_some(Self { window, width })
    }

    pub fn width_ms(&self) -> i64 {
        self.width.num_milliseconds().max(1)
    }

    pub fn count(&self) -> usize {
        let total = self.window.total_ms();
        let w = self.width_ms();
        ((total + w - 1) / w) as usize
    }

    /// `floor((instant - window_start) / width)`; None when outside the grid.
    pub fn index_of(&self, instant: DateTime<Utc>) -> Option<usize> {
        let offset = (instant - self.window.start).num_milliseconds();
        if offset < 0 {
            return None;
        }
        let idx = (offset / self.width_ms()) as usize;
        (idx < self.count() && instant < self.window.end).then_some(idx)
    }

    pub fn bounds(&self, index: usize) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self.window.start + Duration::milliseconds(self.width_ms() * index as i64);
        let end = (start + self.width).min(self.window.end);
        (start, end)
    }

    pub fn info(&self) -> WindowInfo {
        WindowInfo {
            start: self.window.start,
            end: self.window.end,
            bucket_width_secs: self.width.num_seconds(),
        }
    }
}

/// Parses an `HH:MM` (or `HH:MM:SS`) clock-of-day.
pub fn parse_clock(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s.trim(), "%H:%M:%S"))
        .ok()
}

/// Fixed offset from a signed number of minutes east of UTC.
pub fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(minutes.checked_mul(60)?)
}
