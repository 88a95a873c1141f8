// HTTP JSON API consumed by the dashboard front end

mod http;
mod reports;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::source::Sources;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) config: Arc<AppConfig>,
    pub(crate) sources: Arc<Sources>,
}

pub fn app(config: AppConfig, sources: Sources) -> Router {
    let state = AppState {
        config: Arc::new(config),
        sources: Arc::new(sources),
    };
    Router::new()
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/cycle", get(reports::cycle_handler)) // GET /api/cycle?date=
        .route("/api/alarms", get(reports::alarms_handler)) // GET /api/alarms?date=
        .route("/api/cycle/aggregate", post(reports::cycle_aggregate_handler)) // POST /api/cycle/aggregate
        .route("/api/alarms/aggregate", post(reports::alarms_aggregate_handler)) // POST /api/alarms/aggregate
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
