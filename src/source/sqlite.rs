// Columnar SQLite file source: one integer epoch column plus value columns (Val1..ValN).

use std::str::FromStr;

use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, instrument};

use crate::config::SqliteSourceConfig;
use crate::error::SourceError;
use crate::models::{RawSample, RawTimestamp};
use crate::window::WorkingWindow;

pub struct SqliteSource {
    pool: SqlitePool,
    config: SqliteSourceConfig,
}

impl SqliteSource {
    /// Opens the file read-only; a missing file is an error.
    pub async fn connect(config: &SqliteSourceConfig) -> anyhow::Result<Self> {
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", config.path))?
            .read_only(true)
            .create_if_missing(false)
            .busy_timeout(std::time::Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect_with(opts)
            .await?;
        Ok(Self {
            pool,
            config: config.clone(),
        })
    }

    fn select_sql(&self) -> String {
        let ts = &self.config.timestamp_column;
        let cols: Vec<String> = self
            .config
            .columns
            .iter()
            .map(|m| format!("CAST({} AS REAL)", m.column))
            .collect();
        format!(
            "SELECT CAST({ts} AS INTEGER) AS ts, {} FROM {} WHERE {ts} >= $1 AND {ts} < $2 ORDER BY {ts} ASC",
            cols.join(", "),
            self.config.table,
        )
    }

    /// Rows with TS in the window, one sample per configured non-null cell.
    #[instrument(skip(self, window), fields(source = "sqlite", table = %self.config.table))]
    pub async fn fetch(&self, window: &WorkingWindow) -> Result<Vec<RawSample>, SourceError> {
        let unit = self.config.epoch_unit;
        let rows = sqlx::query(&self.select_sql())
            .bind(unit.from_instant(window.start))
            .bind(unit.from_instant(window.end))
            .fetch_all(&self.pool)
            .await?;

        let mut out = Vec::with_capacity(rows.len() * self.config.columns.len());
        for row in rows {
            let ts: i64 = row.try_get(0)?;
            for (i, mapping) in self.config.columns.iter().enumerate() {
                let cell: Option<f64> = row.try_get(i + 1)?;
                match &mapping.label {
                    Some(label) => {
                        if cell.is_some_and(|v| v != 0.0) {
                            out.push(RawSample::alarm(RawTimestamp::Epoch(ts), label, None));
                        }
                    }
                    None => out.push(RawSample {
                        timestamp: Some(RawTimestamp::Epoch(ts)),
                        value: cell,
                        equipment_group: mapping.group.clone(),
                        alarm_label: None,
                    }),
                }
            }
        }
        debug!(samples = out.len(), "sqlite fetch complete");
        Ok(out)
    }
}
