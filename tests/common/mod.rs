// Shared test helpers
#![allow(dead_code)]

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use shiftline::models::{RawSample, RawTimestamp};
use shiftline::timeline::classifier::AlarmGroupTable;
use shiftline::timeline::normalizer::NormalizerConfig;
use shiftline::timeline::{AlarmSettings, CycleSettings};
use shiftline::window::WorkingWindow;

pub fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 14).unwrap()
}

/// UTC instant on the test day.
pub fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 14, h, m, 0).unwrap()
}

pub fn window(from: (u32, u32), to: (u32, u32)) -> WorkingWindow {
    WorkingWindow::new(at(from.0, from.1), at(to.0, to.1)).unwrap()
}

pub fn iso(h: u32, m: u32) -> RawTimestamp {
    RawTimestamp::Text(at(h, m).to_rfc3339())
}

pub fn metric(h: u32, m: u32, value: f64) -> RawSample {
    RawSample::metric(iso(h, m), Some(value))
}

pub fn alarm(h: u32, m: u32, label: &str, duration_secs: Option<f64>) -> RawSample {
    RawSample::alarm(iso(h, m), label, duration_secs)
}

pub fn cycle_settings(window: WorkingWindow, width_secs: i64, threshold: f64) -> CycleSettings {
    CycleSettings {
        window,
        bucket_width: Duration::seconds(width_secs),
        normalizer: NormalizerConfig::default(),
        threshold,
        avg_cycle_seconds: 60.0,
    }
}

pub fn alarm_settings(window: WorkingWindow, width_secs: i64, table: &[(&str, &str)]) -> AlarmSettings {
    AlarmSettings {
        window,
        bucket_width: Duration::seconds(width_secs),
        normalizer: NormalizerConfig::default(),
        groups: AlarmGroupTable::new(table.iter().copied()),
    }
}
