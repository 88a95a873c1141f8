// Data-source collaborators. They only produce RawSample rows; all
// interpretation happens in the timeline pipeline.

pub mod http;
pub mod sqlite;

use tracing::{info, warn};

use crate::config::{AppConfig, SourceConfig};
use crate::error::SourceError;
use crate::models::RawSample;
use crate::window::WorkingWindow;

pub use http::HttpSource;
pub use sqlite::SqliteSource;

pub enum Source {
    Http(HttpSource),
    Sqlite(SqliteSource),
}

impl Source {
    pub async fn connect(config: &SourceConfig) -> anyhow::Result<Self> {
        Ok(match config {
            SourceConfig::Http(c) => Source::Http(HttpSource::new(c)?),
            SourceConfig::Sqlite(c) => Source::Sqlite(SqliteSource::connect(c).await?),
        })
    }

    pub async fn fetch(&self, window: &WorkingWindow) -> Result<Vec<RawSample>, SourceError> {
        match self {
            Source::Http(s) => s.fetch(window).await,
            Source::Sqlite(s) => s.fetch(window).await,
        }
    }
}

/// The configured cycle and alarm sources; either may be absent.
#[derive(Default)]
pub struct Sources {
    pub cycle: Option<Source>,
    pub alarms: Option<Source>,
}

impl Sources {
    /// Connects every configured source. A source that fails to open is
    /// logged and left out, so its endpoint reports "no data".
    pub async fn connect(config: &AppConfig) -> Self {
        Self {
            cycle: connect_optional("cycle", config.cycle.source.as_ref()).await,
            alarms: connect_optional("alarms", config.alarms.source.as_ref()).await,
        }
    }
}

async fn connect_optional(name: &str, config: Option<&SourceConfig>) -> Option<Source> {
    let config = config?;
    match Source::connect(config).await {
        Ok(s) => {
            info!(source = name, "data source ready");
            Some(s)
        }
        Err(e) => {
            warn!(source = name, error = %e, "data source unavailable");
            None
        }
    }
}

/// Fetches from `source`, or fails with `NotConfigured` when there is none.
pub async fn fetch_from(
    source: Option<&Source>,
    name: &'static str,
    window: &WorkingWindow,
) -> Result<Vec<RawSample>, SourceError> {
    match source {
        Some(s) => s.fetch(window).await,
        None => Err(SourceError::NotConfigured(name)),
    }
}
