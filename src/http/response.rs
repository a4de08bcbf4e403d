//! Response capture and transformation.
//!
//! # Responsibilities
//! - Hold a backend response as a plain (status, headers, body) triple
//! - Make a failed body read explicit instead of an empty body
//! - Strip hop-by-hop headers in both directions
//! - Rebuild the caller-facing response from the primary capture
//!
//! # Design Decisions
//! - Responses are fully buffered: both must be compared after the caller
//!   has been answered
//! - Content-Length is recomputed by hyper from the buffered body

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, StatusCode};
use axum::response::Response;
use bytes::Bytes;

/// Headers meaningful only for a single transport hop.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Remove hop-by-hop headers, including any named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in named.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

/// Body of a captured response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapturedBody {
    /// The body was read to the end.
    Complete(Bytes),
    /// Reading failed midway; `partial` holds what arrived before the error.
    Unavailable { partial: Bytes, reason: String },
}

impl CapturedBody {
    /// Bytes available for comparison, complete or not.
    pub fn bytes(&self) -> &Bytes {
        match self {
            CapturedBody::Complete(bytes) => bytes,
            CapturedBody::Unavailable { partial, .. } => partial,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, CapturedBody::Complete(_))
    }
}

/// A backend response reduced to status, headers and body.
#[derive(Debug, Clone)]
pub struct CapturedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: CapturedBody,
}

impl CapturedResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: CapturedBody) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Convenience constructor for a fully read body.
    pub fn complete(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self::new(status, headers, CapturedBody::Complete(body.into()))
    }

    /// Build the response returned to the caller.
    pub fn to_response(&self) -> Response {
        let mut headers = self.headers.clone();
        strip_hop_by_hop(&mut headers);
        headers.remove(header::CONTENT_LENGTH);

        let mut response = Response::new(Body::from(self.body.bytes().clone()));
        *response.status_mut() = self.status;
        *response.headers_mut() = headers;
        response
    }
}
