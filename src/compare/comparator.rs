//! Response comparison.
//!
//! # Check order
//! 1. Backend availability (an upstream error on either side)
//! 2. Status code, unless disabled (equivalence classes honoured)
//! 3. Allow-listed headers, ordered value lists compared exactly
//! 4. Body, unless disabled: structural JSON diff minus excluded paths
//! 5. Body availability: a failed read that survived the checks above on
//!    its partial bytes is still a body mismatch
//!
//! The first failing check decides the outcome; later checks are skipped.

use std::collections::HashSet;

use axum::http::{HeaderMap, HeaderName};
use serde_json::{json, Value};

use crate::backend::{BackendRole, UpstreamError};
use crate::compare::json_diff;
use crate::compare::outcome::{Mismatch, MismatchKind, Outcome};
use crate::config::ComparisonConfig;
use crate::http::response::{CapturedBody, CapturedResponse};

/// Maximum characters of a body kept in mismatch details.
pub const BODY_SAMPLE_CHARS: usize = 200;

/// Status codes grouped into interchangeable classes.
#[derive(Debug, Clone, Default)]
pub struct StatusEquivalence {
    classes: Vec<Vec<u16>>,
}

impl StatusEquivalence {
    pub fn new(classes: Vec<Vec<u16>>) -> Self {
        Self { classes }
    }

    /// Equal codes, or codes sharing a configured class.
    pub fn is_equivalent(&self, a: u16, b: u16) -> bool {
        a == b
            || self
                .classes
                .iter()
                .any(|class| class.contains(&a) && class.contains(&b))
    }
}

/// Equivalence rules, compiled once at startup.
#[derive(Debug, Clone)]
pub struct Comparator {
    compare_status: bool,
    statuses: StatusEquivalence,
    headers: Vec<HeaderName>,
    compare_body: bool,
    excluded_paths: HashSet<String>,
}

impl Comparator {
    /// Build from configuration. Header names that do not parse are skipped
    /// with a warning; validation rejects them before this point.
    pub fn from_config(config: &ComparisonConfig) -> Self {
        let headers = config
            .headers_include
            .iter()
            .filter_map(|name| match HeaderName::from_bytes(name.as_bytes()) {
                Ok(h) => Some(h),
                Err(_) => {
                    tracing::warn!(header = %name, "Ignoring invalid header name in comparison rules");
                    None
                }
            })
            .collect();

        Self {
            compare_status: config.compare_status_code,
            statuses: StatusEquivalence::new(config.equivalent_status_codes.clone()),
            headers,
            compare_body: config.compare_body,
            excluded_paths: config.bodies_exclude.iter().cloned().collect(),
        }
    }

    /// Compare the outcomes of forwarding to the primary (`a`) and shadow (`b`).
    pub fn compare_exchanges(
        &self,
        a: &Result<CapturedResponse, UpstreamError>,
        b: &Result<CapturedResponse, UpstreamError>,
    ) -> Outcome {
        match (a, b) {
            (Ok(a), Ok(b)) => self.compare(a, b),
            _ => {
                let mut details = serde_json::Map::new();
                for (role, result) in [(BackendRole::Primary, a), (BackendRole::Shadow, b)] {
                    if let Err(e) = result {
                        details.insert(role.as_str().to_string(), Value::String(e.to_string()));
                    }
                }
                Mismatch::new(
                    MismatchKind::Backend,
                    "Backend unavailable",
                    Value::Object(details),
                )
                .into()
            }
        }
    }

    /// Compare two captured responses.
    pub fn compare(&self, a: &CapturedResponse, b: &CapturedResponse) -> Outcome {
        for (role, response) in [(BackendRole::Primary, a), (BackendRole::Shadow, b)] {
            if !response.body.is_complete() {
                tracing::warn!(
                    backend = %role,
                    bytes = response.body.bytes().len(),
                    "Comparing partially read body"
                );
            }
        }

        if self.compare_status && !self.statuses.is_equivalent(a.status.as_u16(), b.status.as_u16()) {
            return Mismatch::new(
                MismatchKind::StatusCode,
                "Status codes mismatch",
                json!({
                    "status1": a.status.as_u16(),
                    "status2": b.status.as_u16(),
                }),
            )
            .into();
        }

        if let Some(mismatch) = self.compare_headers(&a.headers, &b.headers) {
            return mismatch.into();
        }

        let body_a = a.body.bytes();
        let body_b = b.body.bytes();
        if self.compare_body && body_a != body_b {
            if let Some(mismatch) = self.compare_bodies(body_a, body_b) {
                return mismatch.into();
            }
        }

        if let Some(mismatch) = incomplete_body(a, b) {
            return mismatch.into();
        }

        Outcome::Identical
    }

    fn compare_headers(&self, a: &HeaderMap, b: &HeaderMap) -> Option<Mismatch> {
        self.headers.iter().find_map(|name| {
            let values_a: Vec<&[u8]> = a.get_all(name).iter().map(|v| v.as_bytes()).collect();
            let values_b: Vec<&[u8]> = b.get_all(name).iter().map(|v| v.as_bytes()).collect();
            if values_a == values_b {
                return None;
            }
            Some(Mismatch::new(
                MismatchKind::Header,
                "Header mismatch",
                json!({
                    "header": name.as_str(),
                    "values1": lossy_all(&values_a),
                    "values2": lossy_all(&values_b),
                }),
            ))
        })
    }

    fn compare_bodies(&self, a: &[u8], b: &[u8]) -> Option<Mismatch> {
        let parsed = serde_json::from_slice::<Value>(a)
            .and_then(|va| serde_json::from_slice::<Value>(b).map(|vb| (va, vb)));

        let (va, vb) = match parsed {
            Ok(pair) => pair,
            Err(e) => {
                return Some(Mismatch::new(
                    MismatchKind::Body,
                    "Body is not comparable JSON",
                    json!({
                        "error": e.to_string(),
                        "body1_sample": truncate(a, BODY_SAMPLE_CHARS),
                        "body2_sample": truncate(b, BODY_SAMPLE_CHARS),
                    }),
                ));
            }
        };

        json_diff::diff(&va, &vb)
            .into_iter()
            .find(|op| !self.excluded_paths.contains(&op.path))
            .map(|op| {
                Mismatch::new(
                    MismatchKind::Body,
                    "Body content mismatch",
                    json!({
                        "diff_path": op.path,
                        "diff_type": op.op.as_str(),
                        "body_sample": truncate(a, BODY_SAMPLE_CHARS),
                    }),
                )
            })
    }
}

/// A body read that failed midway, reported against the first side it hit.
fn incomplete_body(a: &CapturedResponse, b: &CapturedResponse) -> Option<Mismatch> {
    [(BackendRole::Primary, a), (BackendRole::Shadow, b)]
        .into_iter()
        .find_map(|(role, response)| match &response.body {
            CapturedBody::Complete(_) => None,
            CapturedBody::Unavailable { partial, reason } => Some(Mismatch::new(
                MismatchKind::Body,
                "Body read incomplete",
                json!({
                    "unavailable": role.as_str(),
                    "reason": reason,
                    "bytes_read": partial.len(),
                }),
            )),
        })
}

fn lossy_all(values: &[&[u8]]) -> Vec<String> {
    values
        .iter()
        .map(|v| String::from_utf8_lossy(v).into_owned())
        .collect()
}

/// First `max` characters of `bytes`, decoded lossily.
pub fn truncate(bytes: &[u8], max: usize) -> String {
    String::from_utf8_lossy(bytes).chars().take(max).collect()
}
