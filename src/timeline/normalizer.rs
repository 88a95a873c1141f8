// Event normalizer: raw rows -> canonical UTC samples, with per-reason drop counts.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use super::classifier::AlarmGroupTable;
use crate::error::SampleError;
use crate::models::{Diagnostics, NormalizedSample, RawSample, RawTimestamp, SampleKind};
use crate::window::WorkingWindow;

/// Scale of integer epoch timestamps. Always configured per source, never guessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpochUnit {
    #[default]
    Seconds,
    Milliseconds,
    Microseconds,
    Nanoseconds,
}

impl EpochUnit {
    pub fn to_instant(self, v: i64) -> Option<DateTime<Utc>> {
        match self {
            EpochUnit::Seconds => DateTime::from_timestamp(v, 0),
            EpochUnit::Milliseconds => DateTime::from_timestamp_millis(v),
            EpochUnit::Microseconds => DateTime::from_timestamp_micros(v),
            EpochUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(v)),
        }
    }

    /// Inverse of `to_instant`, for building source range filters.
    pub fn from_instant(self, t: DateTime<Utc>) -> i64 {
        match self {
            EpochUnit::Seconds => t.timestamp(),
            EpochUnit::Milliseconds => t.timestamp_millis(),
            EpochUnit::Microseconds => t.timestamp_micros(),
            EpochUnit::Nanoseconds => t.timestamp_nanos_opt().unwrap_or(i64::MAX),
        }
    }
}

/// How one source's rows are turned into samples.
#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    pub epoch_unit: EpochUnit,
    /// Offset at which timezone-naive timestamps were recorded.
    pub naive_offset: FixedOffset,
    /// Metric values are divided by this unless their group has its own factor.
    pub scaling_factor: f64,
    /// Per equipment group overrides of `scaling_factor`.
    pub group_scaling: BTreeMap<String, f64>,
    /// Group for metric rows that carry none.
    pub default_group: String,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            epoch_unit: EpochUnit::Seconds,
            naive_offset: Utc.fix(),
            scaling_factor: 1.0,
            group_scaling: BTreeMap::new(),
            default_group: "default".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Normalized {
    /// Sorted by instant, then group, kind, label and value.
    pub samples: Vec<NormalizedSample>,
    pub diagnostics: Diagnostics,
}

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%d %H:%M%z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses ISO-8601 text or an integer epoch into a UTC instant.
pub fn parse_timestamp(
    raw: &RawTimestamp,
    unit: EpochUnit,
    naive_offset: FixedOffset,
) -> Result<DateTime<Utc>, SampleError> {
    match raw {
        RawTimestamp::Epoch(v) => unit
            .to_instant(*v)
            .ok_or_else(|| SampleError::MalformedTimestamp(v.to_string())),
        RawTimestamp::Text(s) => {
            let s = s.trim();
            if let Ok(v) = s.parse::<i64>() {
                return parse_timestamp(&RawTimestamp::Epoch(v), unit, naive_offset);
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Ok(dt.with_timezone(&Utc));
            }
            // trailing `Z` as an explicit zero offset for the non-RFC 3339 layouts
            let zoned = match s.strip_suffix(['Z', 'z']) {
                Some(head) => format!("{head}+00:00"),
                None => s.to_string(),
            };
            if let Some(dt) = OFFSET_FORMATS
                .iter()
                .find_map(|f| DateTime::parse_from_str(&zoned, f).ok())
            {
                return Ok(dt.with_timezone(&Utc));
            }
            NAIVE_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                .and_then(|naive| naive_offset.from_local_datetime(&naive).single())
                .map(|dt| dt.with_timezone(&Utc))
                .ok_or_else(|| SampleError::MalformedTimestamp(s.to_string()))
        }
    }
}

fn normalize_one(
    raw: &RawSample,
    window: &WorkingWindow,
    config: &NormalizerConfig,
    groups: &AlarmGroupTable,
) -> Result<NormalizedSample, SampleError> {
    let ts = raw
        .timestamp
        .as_ref()
        .ok_or_else(|| SampleError::MalformedTimestamp("missing".to_string()))?;
    let instant = parse_timestamp(ts, config.epoch_unit, config.naive_offset)?;

    if raw.is_alarm() {
        // Absent duration stays absent; it is not a zero-length alarm.
        let duration = raw.value.filter(|v| v.is_finite() && *v >= 0.0);
        if !alarm_overlaps(instant, duration, window) {
            return Err(SampleError::OutOfWindowSample);
        }
        let label = raw.alarm_label.as_deref().unwrap_or_default().trim();
        let group = groups.resolve(label)?;
        return Ok(NormalizedSample {
            instant,
            equipment_group: group.to_string(),
            kind: SampleKind::Alarm,
            value: duration,
            label: Some(label.to_string()),
        });
    }

    if !window.contains(instant) {
        return Err(SampleError::OutOfWindowSample);
    }
    let group = raw
        .equipment_group
        .as_deref()
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .unwrap_or(&config.default_group);
    let factor = config
        .group_scaling
        .get(group)
        .copied()
        .unwrap_or(config.scaling_factor);
    let value = raw
        .value
        .filter(|v| v.is_finite())
        .map(|v| v / factor)
        .unwrap_or(0.0);
    Ok(NormalizedSample {
        instant,
        equipment_group: group.to_string(),
        kind: SampleKind::Metric,
        value: Some(value),
        label: None,
    })
}

/// An alarm raised inside the window always counts. One raised before it
/// counts when its known duration reaches past the window start.
fn alarm_overlaps(instant: DateTime<Utc>, duration: Option<f64>, window: &WorkingWindow) -> bool {
    if window.contains(instant) {
        return true;
    }
    match duration {
        Some(secs) if instant < window.start => {
            let lead_ms = (window.start - instant).num_milliseconds() as f64;
            secs * 1000.0 > lead_ms
        }
        _ => false,
    }
}

/// Normalizes `raw`, dropping malformed, out-of-window and unmapped rows.
/// The result does not depend on input order.
pub fn normalize(
    raw: &[RawSample],
    window: &WorkingWindow,
    config: &NormalizerConfig,
    groups: &AlarmGroupTable,
) -> Normalized {
    let mut samples = Vec::with_capacity(raw.len());
    let mut diagnostics = Diagnostics::default();
    let mut unmapped = BTreeSet::new();

    for r in raw {
        match normalize_one(r, window, config, groups) {
            Ok(s) => samples.push(s),
            Err(SampleError::MalformedTimestamp(_)) => diagnostics.malformed_timestamps += 1,
            Err(SampleError::OutOfWindowSample) => diagnostics.out_of_window += 1,
            Err(SampleError::UnmappedAlarmLabel(label)) => {
                unmapped.insert(label);
            }
        }
    }

    for label in &unmapped {
        warn!(label = %label, "alarm label has no equipment group; events dropped");
    }
    if diagnostics.malformed_timestamps > 0 {
        warn!(
            count = diagnostics.malformed_timestamps,
            "dropped samples with malformed timestamps"
        );
    }
    diagnostics.unmapped_labels = unmapped.into_iter().collect();

    samples.sort_by(|a, b| {
        a.instant
            .cmp(&b.instant)
            .then_with(|| a.equipment_group.cmp(&b.equipment_group))
            .then_with(|| a.kind.cmp(&b.kind))
            .then_with(|| a.label.cmp(&b.label))
            .then_with(|| {
                let av = a.value.unwrap_or(f64::NEG_INFINITY);
                let bv = b.value.unwrap_or(f64::NEG_INFINITY);
                av.total_cmp(&bv)
            })
    });
    debug!(
        input = raw.len(),
        kept = samples.len(),
        out_of_window = diagnostics.out_of_window,
        "normalized samples"
    );

    Normalized {
        samples,
        diagnostics,
    }
}
