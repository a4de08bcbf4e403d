//! Shadow pipeline.
//!
//! # Data Flow
//! ```text
//! RequestSnapshot
//!     → tagged copy forwarded to primary and shadow concurrently
//!     → caller receives the primary response (502 if unreachable)
//!     → detached task: Comparator → stats + metrics + replay log
//! ```
//!
//! # Design Decisions
//! - The route key is derived from the original path, never a rewritten one
//! - The caller's response is built before the comparison is scheduled
//! - Replay entries carry the original request, without the marker header

use std::net::IpAddr;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::backend::{build_client, Backend, BackendRole, TransportError, UpstreamError};
use crate::compare::{Comparator, Outcome};
use crate::config::ProxyConfig;
use crate::http::request::RequestSnapshot;
use crate::http::response::CapturedResponse;
use crate::observability::metrics;
use crate::replay::{ReplayLog, ReplayRecord};
use crate::routing::PathMatcher;
use crate::stats::RouteStatistics;

/// Failure to assemble the pipeline from configuration.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Backend(#[from] UpstreamError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("invalid path pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Everything needed to duplicate, compare and record one request.
#[derive(Debug, Clone)]
pub struct ShadowPipeline {
    primary: Arc<Backend>,
    shadow: Arc<Backend>,
    matcher: Arc<PathMatcher>,
    comparator: Arc<Comparator>,
    statistics: Arc<RouteStatistics>,
    replay_log: Arc<ReplayLog>,
}

impl ShadowPipeline {
    pub fn from_config(config: &ProxyConfig) -> Result<Self, PipelineError> {
        let client = build_client(&config.transport)?;
        let primary = Backend::new(BackendRole::Primary, &config.backends.primary, client.clone())?;
        let shadow = Backend::new(BackendRole::Shadow, &config.backends.shadow, client)?;
        let matcher = PathMatcher::new(config.routes.path_patterns.iter().map(String::as_str))?;

        Ok(Self {
            primary: Arc::new(primary),
            shadow: Arc::new(shadow),
            matcher: Arc::new(matcher),
            comparator: Arc::new(Comparator::from_config(&config.comparison)),
            statistics: Arc::new(RouteStatistics::new()),
            replay_log: Arc::new(ReplayLog::new(config.replay.max_entries_per_key)),
        })
    }

    pub fn statistics(&self) -> &Arc<RouteStatistics> {
        &self.statistics
    }

    pub fn replay_log(&self) -> &Arc<ReplayLog> {
        &self.replay_log
    }

    /// Forward `snapshot` to both backends and answer with the primary's
    /// response. Comparison runs afterwards on a detached task.
    pub async fn handle(&self, snapshot: RequestSnapshot, client_ip: Option<IpAddr>) -> Response {
        let route = self.matcher.route_key(snapshot.path());
        let tagged = snapshot.tagged();

        let (a, b) = tokio::join!(
            self.primary.forward(&tagged, client_ip),
            self.shadow.forward(&tagged, client_ip),
        );

        let response = match &a {
            Ok(captured) => captured.to_response(),
            Err(e) => {
                tracing::error!(
                    request_id = snapshot.request_id().unwrap_or("unknown"),
                    route = %route,
                    error = %e,
                    "Primary backend unavailable"
                );
                (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
            }
        };

        let pipeline = self.clone();
        tokio::spawn(async move {
            pipeline.record_exchange(&route, &snapshot, &a, &b);
        });

        response
    }

    /// Compare a completed exchange and record its outcome.
    pub fn record_exchange(
        &self,
        route: &str,
        snapshot: &RequestSnapshot,
        a: &Result<CapturedResponse, UpstreamError>,
        b: &Result<CapturedResponse, UpstreamError>,
    ) -> Outcome {
        let outcome = self.comparator.compare_exchanges(a, b);
        self.record_outcome(route, snapshot, &outcome);
        outcome
    }

    /// Log, count and store `outcome` for `route`.
    pub fn record_outcome(&self, route: &str, snapshot: &RequestSnapshot, outcome: &Outcome) {
        let label = outcome.label();
        metrics::record_comparison(route, label);
        self.statistics.record(route, outcome);

        match outcome.mismatch() {
            None => {
                tracing::debug!(
                    request_id = snapshot.request_id().unwrap_or("unknown"),
                    route = %route,
                    "Responses identical"
                );
            }
            Some(mismatch) => {
                tracing::info!(
                    request_id = snapshot.request_id().unwrap_or("unknown"),
                    route = %route,
                    method = %snapshot.method,
                    outcome = label,
                    details = %mismatch.details,
                    "{}",
                    mismatch.message
                );
                let record = ReplayRecord::from_snapshot(route, label, snapshot, mismatch.describe());
                self.replay_log.append(route, label, record);
            }
        }
    }
}
