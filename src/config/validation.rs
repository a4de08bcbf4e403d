//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Backend URLs must be absolute `http` or `https` URLs
//! - Route patterns and header names must compile/parse
//! - Value ranges (capacity > 0, status codes in range)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderName;
use regex::Regex;
use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address `{value}`")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: invalid backend URL `{value}` ({reason})")]
    InvalidBackendUrl {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("routes.path_patterns: pattern `{pattern}` does not compile ({reason})")]
    InvalidPathPattern { pattern: String, reason: String },

    #[error("comparison.headers_include: invalid header name `{0}`")]
    InvalidHeaderName(String),

    #[error("comparison.equivalent_status_codes: invalid status code {0}")]
    InvalidStatusCode(u16),

    #[error("replay.max_entries_per_key must be greater than zero")]
    ZeroReplayCapacity,

    #[error("listener.max_body_size must be greater than zero")]
    ZeroBodyLimit,
}

/// Validate a parsed configuration, collecting every error found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.admin.enabled {
        check_address(&mut errors, "admin.bind_address", &config.admin.bind_address);
    }
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    check_backend(&mut errors, "backends.primary", &config.backends.primary);
    check_backend(&mut errors, "backends.shadow", &config.backends.shadow);

    for pattern in &config.routes.path_patterns {
        if let Err(e) = Regex::new(pattern) {
            errors.push(ValidationError::InvalidPathPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            });
        }
    }

    for name in &config.comparison.headers_include {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeaderName(name.clone()));
        }
    }

    for code in config.comparison.equivalent_status_codes.iter().flatten() {
        if !(100..=999).contains(code) {
            errors.push(ValidationError::InvalidStatusCode(*code));
        }
    }

    if config.replay.max_entries_per_key == 0 {
        errors.push(ValidationError::ZeroReplayCapacity);
    }
    if config.listener.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn check_backend(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    let reason = match Url::parse(value) {
        Ok(url) if !matches!(url.scheme(), "http" | "https") => {
            format!("unsupported scheme `{}`", url.scheme())
        }
        Ok(url) if url.host_str().is_none() => "missing host".to_string(),
        Ok(_) => return,
        Err(e) => e.to_string(),
    };
    errors.push(ValidationError::InvalidBackendUrl {
        field,
        value: value.to_string(),
        reason,
    });
}
