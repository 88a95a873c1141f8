use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDate};
use serde::Deserialize;

use crate::timeline::classifier::AlarmGroupTable;
use crate::timeline::normalizer::{EpochUnit, NormalizerConfig};
use crate::timeline::{AlarmSettings, CycleSettings};
use crate::window::{WorkingWindow, offset_from_minutes, parse_clock};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub window: WindowConfig,
    pub cycle: CycleConfig,
    #[serde(default)]
    pub alarms: AlarmsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

/// Working window as local clock-of-day bounds, e.g. 07:00-17:00 at UTC+2.
#[derive(Debug, Clone, Deserialize)]
pub struct WindowConfig {
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub timezone_offset_minutes: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CycleConfig {
    #[serde(default = "default_cycle_bucket_width_secs")]
    pub bucket_width_secs: i64,
    #[serde(default = "default_scaling_factor")]
    pub scaling_factor: f64,
    pub operational_threshold: f64,
    pub avg_cycle_seconds: f64,
    /// Equipment group for metric rows that do not name one.
    #[serde(default = "default_cycle_group")]
    pub group: String,
    #[serde(default)]
    pub source: Option<SourceConfig>,
}

fn default_cycle_bucket_width_secs() -> i64 {
    60
}

fn default_scaling_factor() -> f64 {
    1.0
}

fn default_cycle_group() -> String {
    "Press".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlarmsConfig {
    #[serde(default = "default_alarm_bucket_width_secs")]
    pub bucket_width_secs: i64,
    /// Raw alarm label -> equipment group.
    #[serde(default)]
    pub groups: HashMap<String, String>,
    #[serde(default)]
    pub source: Option<SourceConfig>,
}

impl Default for AlarmsConfig {
    fn default() -> Self {
        Self {
            bucket_width_secs: default_alarm_bucket_width_secs(),
            groups: HashMap::new(),
            source: None,
        }
    }
}

fn default_alarm_bucket_width_secs() -> i64 {
    3600
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    Http(HttpSourceConfig),
    Sqlite(SqliteSourceConfig),
}

impl SourceConfig {
    pub fn epoch_unit(&self) -> EpochUnit {
        match self {
            SourceConfig::Http(c) => c.epoch_unit,
            SourceConfig::Sqlite(c) => c.epoch_unit,
        }
    }

    pub fn naive_offset_minutes(&self) -> i32 {
        match self {
            SourceConfig::Http(c) => c.naive_offset_minutes,
            SourceConfig::Sqlite(_) => 0,
        }
    }

    /// Scaling factor for every metric this source yields, when it sets one.
    pub fn value_scaling(&self) -> Option<f64> {
        match self {
            SourceConfig::Http(c) => c.scaling_factor,
            SourceConfig::Sqlite(_) => None,
        }
    }

    /// Scaling factors of metric columns mapped to a group.
    pub fn group_scaling(&self) -> BTreeMap<String, f64> {
        match self {
            SourceConfig::Http(_) => BTreeMap::new(),
            SourceConfig::Sqlite(c) => c
                .columns
                .iter()
                .filter(|m| m.label.is_none())
                .filter_map(|m| Some((m.group.clone()?, m.scaling_factor?)))
                .collect(),
        }
    }
}

/// Paginated JSON query API (`?fields=..&filters=..&limit=..&offset=..` -> `{"data": [...]}`).
#[derive(Debug, Clone, Deserialize)]
pub struct HttpSourceConfig {
    pub base_url: String,
    #[serde(default = "default_timestamp_field")]
    pub timestamp_field: String,
    pub value_field: String,
    /// Divisor for `value_field`; overrides `cycle.scaling_factor`.
    #[serde(default)]
    pub scaling_factor: Option<f64>,
    #[serde(default)]
    pub group_field: Option<String>,
    /// Field holding the alarm / downtime reason label, for alarm sources.
    #[serde(default)]
    pub label_field: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_max_concurrent_pages")]
    pub max_concurrent_pages: usize,
    #[serde(default)]
    pub epoch_unit: EpochUnit,
    /// UTC offset at which the API's timezone-naive timestamps were recorded.
    #[serde(default)]
    pub naive_offset_minutes: i32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_timestamp_field() -> String {
    "timestamp".into()
}

fn default_page_size() -> usize {
    1000
}

fn default_max_concurrent_pages() -> usize {
    4
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Columnar SQLite file: an integer epoch column plus value columns.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteSourceConfig {
    pub path: String,
    pub table: String,
    #[serde(default = "default_timestamp_column")]
    pub timestamp_column: String,
    #[serde(default)]
    pub epoch_unit: EpochUnit,
    pub columns: Vec<ColumnMapping>,
}

fn default_timestamp_column() -> String {
    "TS".into()
}

/// One value column. With `label` set, a non-zero cell is an alarm event with
/// that label; otherwise the cell is a metric reading for `group`.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnMapping {
    pub column: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    /// Divisor for this metric column; overrides `cycle.scaling_factor`.
    #[serde(default)]
    pub scaling_factor: Option<f64>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        let start = parse_clock(&self.window.start);
        let end = parse_clock(&self.window.end);
        anyhow::ensure!(
            start.is_some(),
            "window.start must be HH:MM, got {:?}",
            self.window.start
        );
        anyhow::ensure!(
            end.is_some(),
            "window.end must be HH:MM, got {:?}",
            self.window.end
        );
        anyhow::ensure!(
            start < end,
            "window.start must be before window.end, got {} - {}",
            self.window.start,
            self.window.end
        );
        anyhow::ensure!(
            self.window.timezone_offset_minutes.abs() <= 14 * 60,
            "window.timezone_offset_minutes must be within +/-840, got {}",
            self.window.timezone_offset_minutes
        );
        anyhow::ensure!(
            self.cycle.bucket_width_secs > 0,
            "cycle.bucket_width_secs must be > 0, got {}",
            self.cycle.bucket_width_secs
        );
        anyhow::ensure!(
            self.cycle.scaling_factor.is_finite() && self.cycle.scaling_factor != 0.0,
            "cycle.scaling_factor must be finite and non-zero, got {}",
            self.cycle.scaling_factor
        );
        anyhow::ensure!(
            self.cycle.operational_threshold.is_finite(),
            "cycle.operational_threshold must be finite"
        );
        anyhow::ensure!(
            self.cycle.avg_cycle_seconds.is_finite() && self.cycle.avg_cycle_seconds > 0.0,
            "cycle.avg_cycle_seconds must be > 0, got {}",
            self.cycle.avg_cycle_seconds
        );
        anyhow::ensure!(
            !self.cycle.group.trim().is_empty(),
            "cycle.group must be non-empty"
        );
        anyhow::ensure!(
            self.alarms.bucket_width_secs > 0,
            "alarms.bucket_width_secs must be > 0, got {}",
            self.alarms.bucket_width_secs
        );
        for (label, group) in &self.alarms.groups {
            anyhow::ensure!(
                !label.trim().is_empty() && !group.trim().is_empty(),
                "alarms.groups entries must have non-empty label and group, got {:?} = {:?}",
                label,
                group
            );
        }
        if let Some(source) = &self.cycle.source {
            validate_source("cycle.source", source)?;
        }
        if let Some(source) = &self.alarms.source {
            validate_source("alarms.source", source)?;
        }
        Ok(())
    }

    /// UTC working window for a calendar date.
    pub fn window_for(&self, date: NaiveDate) -> anyhow::Result<WorkingWindow> {
        let start = parse_clock(&self.window.start)
            .ok_or_else(|| anyhow::anyhow!("window.start: {}", self.window.start))?;
        let end = parse_clock(&self.window.end)
            .ok_or_else(|| anyhow::anyhow!("window.end: {}", self.window.end))?;
        let offset = offset_from_minutes(self.window.timezone_offset_minutes)
            .ok_or_else(|| anyhow::anyhow!("window.timezone_offset_minutes out of range"))?;
        WorkingWindow::for_date(date, start, end, offset)
            .ok_or_else(|| anyhow::anyhow!("empty working window for {}", date))
    }

    /// Cycle pipeline settings for `date`, reading timestamps the way the
    /// configured cycle source encodes them.
    pub fn cycle_settings(&self, date: NaiveDate) -> anyhow::Result<CycleSettings> {
        Ok(CycleSettings {
            window: self.window_for(date)?,
            bucket_width: Duration::seconds(self.cycle.bucket_width_secs),
            normalizer: normalizer_config(
                self.cycle.source.as_ref(),
                self.cycle.scaling_factor,
                &self.cycle.group,
            )?,
            threshold: self.cycle.operational_threshold,
            avg_cycle_seconds: self.cycle.avg_cycle_seconds,
        })
    }

    pub fn alarm_settings(&self, date: NaiveDate) -> anyhow::Result<AlarmSettings> {
        Ok(AlarmSettings {
            window: self.window_for(date)?,
            bucket_width: Duration::seconds(self.alarms.bucket_width_secs),
            normalizer: normalizer_config(
                self.alarms.source.as_ref(),
                1.0,
                &self.cycle.group,
            )?,
            groups: AlarmGroupTable::from_map(&self.alarms.groups),
        })
    }
}

fn normalizer_config(
    source: Option<&SourceConfig>,
    scaling_factor: f64,
    default_group: &str,
) -> anyhow::Result<NormalizerConfig> {
    let minutes = source.map(SourceConfig::naive_offset_minutes).unwrap_or(0);
    Ok(NormalizerConfig {
        epoch_unit: source.map(SourceConfig::epoch_unit).unwrap_or_default(),
        naive_offset: offset_from_minutes(minutes)
            .ok_or_else(|| anyhow::anyhow!("naive_offset_minutes out of range: {}", minutes))?,
        scaling_factor: source
            .and_then(SourceConfig::value_scaling)
            .unwrap_or(scaling_factor),
        group_scaling: source.map(SourceConfig::group_scaling).unwrap_or_default(),
        default_group: default_group.to_string(),
    })
}

fn validate_scaling(key: &str, factor: Option<f64>) -> anyhow::Result<()> {
    if let Some(f) = factor {
        anyhow::ensure!(
            f.is_finite() && f != 0.0,
            "{key} must be finite and non-zero, got {f}"
        );
    }
    Ok(())
}

fn validate_source(key: &str, source: &SourceConfig) -> anyhow::Result<()> {
    match source {
        SourceConfig::Http(c) => {
            anyhow::ensure!(
                c.base_url.starts_with("http://") || c.base_url.starts_with("https://"),
                "{key}.base_url must be an http(s) URL, got {:?}",
                c.base_url
            );
            anyhow::ensure!(
                !c.value_field.is_empty(),
                "{key}.value_field must be non-empty"
            );
            validate_scaling(&format!("{key}.scaling_factor"), c.scaling_factor)?;
            anyhow::ensure!(
                c.page_size > 0,
                "{key}.page_size must be > 0, got {}",
                c.page_size
            );
            anyhow::ensure!(
                c.max_concurrent_pages > 0,
                "{key}.max_concurrent_pages must be > 0, got {}",
                c.max_concurrent_pages
            );
            anyhow::ensure!(
                c.naive_offset_minutes.abs() <= 14 * 60,
                "{key}.naive_offset_minutes must be within +/-840, got {}",
                c.naive_offset_minutes
            );
        }
        SourceConfig::Sqlite(c) => {
            anyhow::ensure!(!c.path.is_empty(), "{key}.path must be non-empty");
            anyhow::ensure!(
                is_identifier(&c.table),
                "{key}.table must be a plain identifier, got {:?}",
                c.table
            );
            anyhow::ensure!(
                is_identifier(&c.timestamp_column),
                "{key}.timestamp_column must be a plain identifier, got {:?}",
                c.timestamp_column
            );
            anyhow::ensure!(
                !c.columns.is_empty(),
                "{key}.columns must name at least one column"
            );
            for m in &c.columns {
                anyhow::ensure!(
                    is_identifier(&m.column),
                    "{key}.columns: {:?} is not a plain identifier",
                    m.column
                );
                validate_scaling(
                    &format!("{key}.columns.{}.scaling_factor", m.column),
                    m.scaling_factor,
                )?;
            }
        }
    }
    Ok(())
}

/// ASCII letters, digits and `_`, not starting with a digit.
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
