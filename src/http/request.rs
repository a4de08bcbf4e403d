//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4)
//! - Buffer the inbound request once into an immutable snapshot
//! - Produce the tagged copy forwarded to both backends
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Original request preserved for replay; tagged copy forwarded
//! - Body held as `Bytes`, so copies share one allocation

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Request, Uri, Version};
use axum::middleware::Next;
use axum::response::Response;
use bytes::Bytes;
use tower_http::request_id::{MakeRequestId, RequestId};

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Header marking a request as duplicated by this proxy.
pub const SHADOW_MARKER_HEADER: HeaderName = HeaderName::from_static("x-source-proxy");

/// Value of [`SHADOW_MARKER_HEADER`].
pub const SHADOW_MARKER_VALUE: &str = "shadow-proxy";

/// Generates UUID v4 request IDs for `SetRequestIdLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Request extension set when the client sent no request ID and the proxy
/// assigned one.
#[derive(Debug, Clone, Copy)]
pub struct GeneratedRequestId;

/// Must run outside `SetRequestIdLayer` so it sees the client's headers.
pub async fn mark_generated_request_id(mut request: Request<Body>, next: Next) -> Response {
    if !request.headers().contains_key(X_REQUEST_ID) {
        request.extensions_mut().insert(GeneratedRequestId);
    }
    next.run(request).await
}

/// Immutable copy of an inbound request with its body fully buffered.
#[derive(Debug, Clone)]
pub struct RequestSnapshot {
    pub method: Method,
    pub uri: Uri,
    pub version: Version,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// `x-request-id` was added by the proxy, not sent by the client.
    pub request_id_generated: bool,
}

impl RequestSnapshot {
    pub fn new(method: Method, uri: Uri, version: Version, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            uri,
            version,
            headers,
            body,
            request_id_generated: false,
        }
    }

    /// Mark the `x-request-id` header as proxy-assigned.
    pub fn with_generated_request_id(mut self, generated: bool) -> Self {
        self.request_id_generated = generated;
        self
    }

    /// Copy of this request carrying the shadow marker header.
    pub fn tagged(&self) -> Self {
        let mut copy = self.clone();
        copy.headers.append(
            SHADOW_MARKER_HEADER,
            HeaderValue::from_static(SHADOW_MARKER_VALUE),
        );
        copy
    }

    /// Request path without the query string.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// The request ID assigned on entry, if any.
    pub fn request_id(&self) -> Option<&str> {
        self.headers.get(X_REQUEST_ID).and_then(|v| v.to_str().ok())
    }
}
