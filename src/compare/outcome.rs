//! Comparison outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Label recorded for identical responses.
pub const IDENTICAL_LABEL: &str = "ok";

/// Category of a divergence between the two backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    /// A backend could not be reached or failed before responding.
    Backend,
    StatusCode,
    Header,
    Body,
}

impl MismatchKind {
    /// Outcome label used for statistics, metrics and replay keys.
    pub fn label(&self) -> &'static str {
        match self {
            MismatchKind::Backend => "backend error",
            MismatchKind::StatusCode => "status code mismatch",
            MismatchKind::Header => "header mismatch",
            MismatchKind::Body => "body mismatch",
        }
    }
}

impl fmt::Display for MismatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A typed divergence with machine-readable details.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("{kind}: {message}")]
pub struct Mismatch {
    pub kind: MismatchKind,
    pub message: String,
    /// JSON object of kind-specific fields.
    pub details: Value,
}

impl Mismatch {
    pub fn new(kind: MismatchKind, message: impl Into<String>, details: Value) -> Self {
        Self {
            kind,
            message: message.into(),
            details,
        }
    }

    /// Human-readable summary stored alongside replay entries.
    pub fn describe(&self) -> String {
        format!("{}: {}", self.message, self.details)
    }
}

/// Result of comparing one pair of responses.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Identical,
    Mismatch(Mismatch),
}

impl Outcome {
    pub fn is_identical(&self) -> bool {
        matches!(self, Outcome::Identical)
    }

    /// `ok` for identical responses, otherwise the mismatch kind's label.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Identical => IDENTICAL_LABEL,
            Outcome::Mismatch(m) => m.kind.label(),
        }
    }

    pub fn mismatch(&self) -> Option<&Mismatch> {
        match self {
            Outcome::Identical => None,
            Outcome::Mismatch(m) => Some(m),
        }
    }
}

impl From<Mismatch> for Outcome {
    fn from(m: Mismatch) -> Self {
        Outcome::Mismatch(m)
    }
}
