// Paginated HTTP query source. Pages after the first are fetched in bounded
// concurrent batches and concatenated strictly in page order.

use std::time::Duration;

use chrono::Offset;
use futures_util::{StreamExt, stream};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::config::HttpSourceConfig;
use crate::error::SourceError;
use crate::models::{RawSample, RawTimestamp};
use crate::window::{WorkingWindow, offset_from_minutes};

/// Upper bound on pages per request, in case the server ignores `offset`.
const MAX_PAGES: usize = 10_000;

pub struct HttpSource {
    client: reqwest::Client,
    config: HttpSourceConfig,
}

impl HttpSource {
    pub fn new(config: &HttpSourceConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn field_list(&self) -> Vec<&str> {
        let mut fields = vec![
            self.config.timestamp_field.as_str(),
            self.config.value_field.as_str(),
        ];
        fields.extend(self.config.group_field.as_deref());
        fields.extend(self.config.label_field.as_deref());
        fields
    }

    /// `[from, to)` rendered the way the API stores timestamps.
    fn range_filter(&self, window: &WorkingWindow) -> Value {
        let offset = offset_from_minutes(self.config.naive_offset_minutes)
            .unwrap_or_else(|| chrono::Utc.fix());
        let fmt = |t: chrono::DateTime<chrono::Utc>| {
            t.with_timezone(&offset)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        };
        let ts = &self.config.timestamp_field;
        serde_json::json!([
            [ts, ">=", fmt(window.start)],
            [ts, "<", fmt(window.end)],
        ])
    }

    async fn fetch_page(&self, page: usize, filters: &str) -> Result<Vec<RawSample>, SourceError> {
        let fields = serde_json::to_string(&self.field_list())
            .map_err(|e| SourceError::InvalidPayload(e.to_string()))?;
        let limit = self.config.page_size.to_string();
        let offset = (page * self.config.page_size).to_string();
        let body: Value = self
            .client
            .get(&self.config.base_url)
            .header("Accept", "application/json")
            .query(&[
                ("fields", fields.as_str()),
                ("filters", filters),
                ("limit", limit.as_str()),
                ("offset", offset.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let rows = body
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| SourceError::InvalidPayload(format!("page {page}: missing data array")))?;
        Ok(rows.iter().map(|r| self.row_to_sample(r)).collect())
    }

    fn row_to_sample(&self, row: &Value) -> RawSample {
        let timestamp = row.get(&self.config.timestamp_field).and_then(|v| match v {
            Value::Number(n) => n.as_i64().map(RawTimestamp::Epoch),
            Value::String(s) => Some(RawTimestamp::Text(s.clone())),
            _ => None,
        });
        let value = row.get(&self.config.value_field).and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        });
        let text = |field: &Option<String>| {
            field
                .as_deref()
                .and_then(|f| row.get(f))
                .and_then(label_text)
        };
        RawSample {
            timestamp,
            value,
            equipment_group: text(&self.config.group_field),
            alarm_label: text(&self.config.label_field),
        }
    }

    /// All rows in the window. A failed page fails the whole fetch; nothing is retried.
    #[instrument(skip(self, window), fields(source = "http"))]
    pub async fn fetch(&self, window: &WorkingWindow) -> Result<Vec<RawSample>, SourceError> {
        let filters = self.range_filter(window).to_string();
        let page_size = self.config.page_size;
        let batch = self.config.max_concurrent_pages;

        let mut out = self.fetch_page(0, &filters).await?;
        let mut last_len = out.len();
        let mut next = 1;

        'pages: while last_len >= page_size && next < MAX_PAGES {
            let pages: Vec<Result<Vec<RawSample>, SourceError>> =
                stream::iter(next..(next + batch).min(MAX_PAGES))
                    .map(|p| self.fetch_page(p, &filters))
                    .buffered(batch)
                    .collect()
                    .await;
            for page in pages {
                let page = page?;
                last_len = page.len();
                out.extend(page);
                if last_len < page_size {
                    break 'pages;
                }
            }
            next += batch;
        }
        if last_len >= page_size && next >= MAX_PAGES {
            warn!(pages = MAX_PAGES, "page limit reached; result truncated");
        }
        debug!(samples = out.len(), "http fetch complete");
        Ok(out)
    }
}

/// Label text from a string, number, or list of those (joined with ", ").
fn label_text(v: &Value) -> Option<String> {
    let text = match v {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(label_text)
            .collect::<Vec<_>>()
            .join(", "),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}
