//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router accepting every method and path
//! - Wire up middleware (tracing, request ID)
//! - Buffer the inbound request into a snapshot
//! - Hand the snapshot to the shadow pipeline
//! - Run the proxy and admin listeners until shutdown

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::admin::admin_router;
use crate::config::ProxyConfig;
use crate::http::request::{
    mark_generated_request_id, GeneratedRequestId, MakeRequestUuid, RequestSnapshot,
};
use crate::lifecycle::shutdown::{self, Shutdown};
use crate::pipeline::{PipelineError, ShadowPipeline};
use crate::replay::ReplayLog;
use crate::stats::RouteStatistics;

/// Application state injected into handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub pipeline: ShadowPipeline,
    pub max_body_size: usize,
    pub admin_api_key: Option<String>,
}

/// Failure while accepting an inbound request.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("failed to read request body: {0}")]
    BodyRead(#[source] axum::Error),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match self {
            ProxyError::BodyRead(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read request body").into_response()
            }
        }
    }
}

/// HTTP server for the shadowing proxy.
pub struct HttpServer {
    state: AppState,
    config: ProxyConfig,
}

impl HttpServer {
    /// Build the pipeline and its shared services from `config`.
    pub fn new(config: ProxyConfig) -> Result<Self, PipelineError> {
        let pipeline = ShadowPipeline::from_config(&config)?;
        let state = AppState {
            pipeline,
            max_body_size: config.listener.max_body_size,
            admin_api_key: config.admin.api_key.clone(),
        };
        Ok(Self { state, config })
    }

    /// The proxy router with all middleware layers.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(self.state.clone())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(middleware::from_fn(mark_generated_request_id))
    }

    /// The admin and debug router.
    pub fn admin_router(&self) -> Router {
        admin_router(self.state.clone())
    }

    /// Shared pipeline handle; clones observe the same statistics and log.
    pub fn pipeline(&self) -> &ShadowPipeline {
        &self.state.pipeline
    }

    pub fn statistics(&self) -> &RouteStatistics {
        self.state.pipeline.statistics()
    }

    pub fn replay_log(&self) -> &ReplayLog {
        self.state.pipeline.replay_log()
    }

    /// Serve until `shutdown` fires. The admin listener is bound here when
    /// enabled and stops with the proxy.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            primary = %self.config.backends.primary,
            shadow = %self.config.backends.shadow,
            "HTTP server starting"
        );

        let admin_task = if self.config.admin.enabled {
            let admin_listener = TcpListener::bind(&self.config.admin.bind_address).await?;
            tracing::info!(address = %admin_listener.local_addr()?, "Admin server starting");
            let admin = self.admin_router();
            let rx = shutdown.subscribe();
            Some(tokio::spawn(async move {
                axum::serve(admin_listener, admin)
                    .with_graceful_shutdown(shutdown::recv(rx))
                    .await
            }))
        } else {
            None
        };

        let app = self.router().into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::recv(shutdown.subscribe()))
            .await?;

        if let Some(task) = admin_task {
            match task.await {
                Ok(result) => result?,
                Err(e) => tracing::error!(error = %e, "Admin server task failed"),
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler.
/// Buffers the request and hands it to the shadow pipeline.
async fn proxy_handler(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Result<Response, ProxyError> {
    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let generated_id = request.extensions().get::<GeneratedRequestId>().is_some();

    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, state.max_body_size)
        .await
        .map_err(|e| {
            tracing::warn!(path = %parts.uri.path(), error = %e, "Failed to read request body");
            ProxyError::BodyRead(e)
        })?;

    let snapshot = RequestSnapshot::new(parts.method, parts.uri, parts.version, parts.headers, body)
        .with_generated_request_id(generated_id);

    tracing::debug!(
        request_id = snapshot.request_id().unwrap_or("unknown"),
        method = %snapshot.method,
        path = %snapshot.path(),
        "Shadowing request"
    );

    Ok(state.pipeline.handle(snapshot, client_ip).await)
}
