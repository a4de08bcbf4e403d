//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent one of the two upstream hosts
//! - Rewrite a request snapshot onto the backend base URL
//! - Execute the call and capture status, headers and body
//! - Keep a body read failure distinct from an unreachable backend

use std::fmt;
use std::net::IpAddr;

use axum::body::Body;
use axum::http::{header::HeaderValue, HeaderName, Request, Uri};
use bytes::BytesMut;
use http_body_util::BodyExt;
use thiserror::Error;
use url::Url;

use crate::backend::transport::HttpClient;
use crate::http::request::RequestSnapshot;
use crate::http::response::{strip_hop_by_hop, CapturedBody, CapturedResponse};

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Which side of the comparison a backend sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendRole {
    /// Authoritative: its response goes back to the caller.
    Primary,
    /// Compared only.
    Shadow,
}

impl BackendRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendRole::Primary => "primary",
            BackendRole::Shadow => "shadow",
        }
    }
}

impl fmt::Display for BackendRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure to obtain a response from a backend.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("invalid backend URL `{0}`")]
    InvalidBaseUrl(String),

    #[error("failed to build upstream request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("upstream request failed: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),
}

/// A single backend server.
#[derive(Debug, Clone)]
pub struct Backend {
    role: BackendRole,
    base_url: Url,
    client: HttpClient,
}

impl Backend {
    /// Create a backend for `base_url`, sharing `client`'s connection pool.
    pub fn new(role: BackendRole, base_url: &str, client: HttpClient) -> Result<Self, UpstreamError> {
        let base_url = Url::parse(base_url)
            .ok()
            .filter(|u| u.host_str().is_some())
            .ok_or_else(|| UpstreamError::InvalidBaseUrl(base_url.to_string()))?;
        Ok(Self {
            role,
            base_url,
            client,
        })
    }

    /// Target URI for an inbound URI: base path joined with the request path,
    /// base query and request query concatenated.
    pub fn target_uri(&self, inbound: &Uri) -> Result<Uri, UpstreamError> {
        let base_path = self.base_url.path().trim_end_matches('/');
        let mut path_and_query = format!("{}{}", base_path, inbound.path());

        let queries: Vec<&str> = [self.base_url.query(), inbound.query()]
            .into_iter()
            .flatten()
            .filter(|q| !q.is_empty())
            .collect();
        if !queries.is_empty() {
            path_and_query.push('?');
            path_and_query.push_str(&queries.join("&"));
        }

        let authority = match self.base_url.port() {
            Some(port) => format!("{}:{}", self.base_url.host_str().unwrap_or_default(), port),
            None => self.base_url.host_str().unwrap_or_default().to_string(),
        };

        Ok(Uri::builder()
            .scheme(self.base_url.scheme())
            .authority(authority.as_str())
            .path_and_query(path_and_query.as_str())
            .build()?)
    }

    /// Forward `snapshot` and capture the full response.
    ///
    /// Transport errors are returned; a failure while reading the body is
    /// not, it produces [`CapturedBody::Unavailable`] instead.
    pub async fn forward(
        &self,
        snapshot: &RequestSnapshot,
        client_ip: Option<IpAddr>,
    ) -> Result<CapturedResponse, UpstreamError> {
        let uri = self.target_uri(&snapshot.uri)?;

        let mut headers = snapshot.headers.clone();
        strip_hop_by_hop(&mut headers);
        if let Some(ip) = client_ip {
            let mut hops: Vec<String> = headers
                .get_all(&X_FORWARDED_FOR)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .map(str::to_string)
                .collect();
            hops.push(ip.to_string());
            let forwarded = hops.join(", ");
            if let Ok(value) = HeaderValue::from_str(&forwarded) {
                headers.insert(X_FORWARDED_FOR, value);
            }
        }

        let mut request = Request::builder()
            .method(snapshot.method.clone())
            .uri(uri)
            .body(Body::from(snapshot.body.clone()))?;
        *request.headers_mut() = headers;

        let response = self.client.request(request).await?;
        let (parts, mut body) = response.into_parts();

        let mut buf = BytesMut::new();
        let body = loop {
            match body.frame().await {
                Some(Ok(frame)) => {
                    if let Ok(data) = frame.into_data() {
                        buf.extend_from_slice(&data);
                    }
                }
                Some(Err(e)) => {
                    tracing::warn!(
                        backend = %self.role,
                        error = %e,
                        bytes_read = buf.len(),
                        "Error reading backend response body"
                    );
                    break CapturedBody::Unavailable {
                        partial: buf.freeze(),
                        reason: e.to_string(),
                    };
                }
                None => break CapturedBody::Complete(buf.freeze()),
            }
        };

        Ok(CapturedResponse::new(parts.status, parts.headers, body))
    }
}
