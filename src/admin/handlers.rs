use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::http::server::AppState;
use crate::replay::ReplayRecord;
use crate::stats::RouteStatsSnapshot;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub routes_observed: usize,
    pub replay_entries: usize,
}

/// Filter for `/debug/errors`.
#[derive(Debug, Deserialize)]
pub struct ErrorsQuery {
    #[serde(default)]
    pub api: String,
    #[serde(default)]
    pub state: String,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        routes_observed: state.pipeline.statistics().route_count(),
        replay_entries: state.pipeline.replay_log().len(),
    })
}

pub async fn get_stats(State(state): State<AppState>) -> Json<Vec<RouteStatsSnapshot>> {
    Json(state.pipeline.statistics().snapshot_all())
}

/// Replay entries for one route and outcome; `[]` when there are none.
pub async fn get_errors(
    State(state): State<AppState>,
    Query(query): Query<ErrorsQuery>,
) -> Json<Vec<ReplayRecord>> {
    Json(state.pipeline.replay_log().query(&query.api, &query.state))
}
