//! Outbound HTTP transport.
//!
//! One pooled client is shared by both backends. It speaks plain HTTP and
//! HTTPS (rustls, webpki roots); the tunables map onto connector and pool
//! settings of the hyper-util legacy client.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::body::Body;
use axum::http::Uri;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use tower::Service;

use crate::config::TransportConfig;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Client type used to reach backends.
pub type HttpClient = Client<TimeoutConnector<HttpsConnector<HttpConnector>>, Body>;

/// Failure to construct the transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to configure TLS: {0}")]
    Tls(#[from] rustls::Error),
}

/// Connection setup did not finish in time.
#[derive(Debug, Error)]
#[error("connection setup exceeded {0:?}")]
pub struct ConnectTimeout(Duration);

/// Bounds the whole connection setup (dial plus TLS handshake).
#[derive(Debug, Clone)]
pub struct TimeoutConnector<C> {
    inner: C,
    timeout: Duration,
}

impl<C> TimeoutConnector<C> {
    pub fn new(inner: C, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

impl<C> Service<Uri> for TimeoutConnector<C>
where
    C: Service<Uri>,
    C::Error: Into<BoxError>,
    C::Future: Send + 'static,
    C::Response: Send + 'static,
{
    type Response = C::Response;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, uri: Uri) -> Self::Future {
        let connecting = self.inner.call(uri);
        let timeout = self.timeout;
        Box::pin(async move {
            match tokio::time::timeout(timeout, connecting).await {
                Ok(result) => result.map_err(Into::into),
                Err(_) => Err(ConnectTimeout(timeout).into()),
            }
        })
    }
}

/// Build the shared client from transport configuration.
pub fn build_client(config: &TransportConfig) -> Result<HttpClient, TransportError> {
    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(Some(Duration::from_millis(config.connect_timeout_ms)));
    if config.keepalive_secs > 0 {
        http.set_keepalive(Some(Duration::from_secs(config.keepalive_secs)));
    }
    http.set_nodelay(true);

    let https = HttpsConnectorBuilder::new()
        .with_provider_and_webpki_roots(rustls::crypto::ring::default_provider())?
        .https_or_http()
        .enable_http1()
        .wrap_connector(http);

    let setup = Duration::from_millis(config.connect_timeout_ms + config.tls_handshake_timeout_ms);

    Ok(Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .build(TimeoutConnector::new(https, setup)))
}
