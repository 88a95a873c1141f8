// Report handlers: fetch from a configured source (GET) or take samples in the
// request body (POST), then run the cycle or alarm pipeline.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{Days, NaiveDate, Offset, Utc};
use serde::Deserialize;
use tracing::{instrument, warn};

use super::AppState;
use crate::models::{RawSample, Report};
use crate::source;
use crate::timeline::{
    self,
    normalizer::{EpochUnit, NormalizerConfig},
};
use crate::window::offset_from_minutes;

#[derive(Debug, Deserialize)]
pub(super) struct DateQuery {
    date: Option<NaiveDate>,
}

/// Caller-supplied samples. The timestamp encoding defaults to that of the
/// configured source for the same report.
#[derive(Debug, Deserialize)]
pub(super) struct AggregateRequest {
    date: Option<NaiveDate>,
    samples: Vec<RawSample>,
    #[serde(default)]
    epoch_unit: Option<EpochUnit>,
    #[serde(default)]
    naive_offset_minutes: Option<i32>,
}

fn bad_request(msg: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": msg }))).into_response()
}

/// Yesterday in the site's local time, matching the dashboard's default pick.
fn resolve_date(state: &AppState, date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| {
        let offset = offset_from_minutes(state.config.window.timezone_offset_minutes)
            .unwrap_or(Utc.fix());
        let today = Utc::now().with_timezone(&offset).date_naive();
        today.checked_sub_days(Days::new(1)).unwrap_or(today)
    })
}

/// Overrides the timestamp encoding with what the request specifies.
fn apply_encoding(
    req: &AggregateRequest,
    normalizer: &mut NormalizerConfig,
) -> Result<(), Response> {
    if let Some(unit) = req.epoch_unit {
        normalizer.epoch_unit = unit;
    }
    if let Some(minutes) = req.naive_offset_minutes {
        normalizer.naive_offset = offset_from_minutes(minutes).ok_or_else(|| {
            bad_request(format!("naive_offset_minutes out of range: {minutes}"))
        })?;
    }
    Ok(())
}

fn no_data_for(name: &str, e: &crate::error::SourceError) -> Report {
    warn!(source = name, error = %e, "source fetch failed");
    Report::no_data(format!("no data available: {e}"))
}

#[instrument(skip(state))]
pub(super) async fn cycle_handler(
    State(state): State<AppState>,
    Query(q): Query<DateQuery>,
) -> Response {
    let date = resolve_date(&state, q.date);
    let settings = match state.config.cycle_settings(date) {
        Ok(s) => s,
        Err(e) => return bad_request(e.to_string()),
    };
    let report = match source::fetch_from(state.sources.cycle.as_ref(), "cycle", &settings.window)
        .await
    {
        Ok(raw) => timeline::cycle_report(&raw, &settings),
        Err(e) => no_data_for("cycle", &e),
    };
    Json(report).into_response()
}

#[instrument(skip(state))]
pub(super) async fn alarms_handler(
    State(state): State<AppState>,
    Query(q): Query<DateQuery>,
) -> Response {
    let date = resolve_date(&state, q.date);
    let settings = match state.config.alarm_settings(date) {
        Ok(s) => s,
        Err(e) => return bad_request(e.to_string()),
    };
    let report =
        match source::fetch_from(state.sources.alarms.as_ref(), "alarms", &settings.window).await
        {
            Ok(raw) => timeline::alarm_report(&raw, &settings),
            Err(e) => no_data_for("alarms", &e),
        };
    Json(report).into_response()
}

#[instrument(skip(state, req), fields(samples = req.samples.len()))]
pub(super) async fn cycle_aggregate_handler(
    State(state): State<AppState>,
    Json(req): Json<AggregateRequest>,
) -> Response {
    let date = resolve_date(&state, req.date);
    let mut settings = match state.config.cycle_settings(date) {
        Ok(s) => s,
        Err(e) => return bad_request(e.to_string()),
    };
    if let Err(resp) = apply_encoding(&req, &mut settings.normalizer) {
        return resp;
    }
    Json(timeline::cycle_report(&req.samples, &settings)).into_response()
}

#[instrument(skip(state, req), fields(samples = req.samples.len()))]
pub(super) async fn alarms_aggregate_handler(
    State(state): State<AppState>,
    Json(req): Json<AggregateRequest>,
) -> Response {
    let date = resolve_date(&state, req.date);
    let mut settings = match state.config.alarm_settings(date) {
        Ok(s) => s,
        Err(e) => return bad_request(e.to_string()),
    };
    if let Err(resp) = apply_encoding(&req, &mut settings.normalizer) {
        return resp;
    }
    Json(timeline::alarm_report(&req.samples, &settings)).into_response()
}
