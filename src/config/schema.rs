//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the shadowing proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// The two upstream hosts receiving duplicated traffic.
    pub backends: BackendsConfig,

    /// Outbound transport tuning shared by both backends.
    pub transport: TransportConfig,

    /// Equivalence rules applied when comparing responses.
    pub comparison: ComparisonConfig,

    /// Route templates used to bucket statistics.
    pub routes: RoutesConfig,

    /// Replay log sizing.
    pub replay: ReplayConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin / debug endpoint settings.
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:18080").
    pub bind_address: String,

    /// Maximum inbound body size in bytes. Bodies are buffered in memory.
    pub max_body_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:18080".to_string(),
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Backend base URLs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendsConfig {
    /// Authoritative backend; its response is returned to the caller.
    pub primary: String,

    /// Shadow backend; its response is only compared.
    pub shadow: String,
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            primary: "http://127.0.0.1:8081".to_string(),
            shadow: "http://127.0.0.1:8082".to_string(),
        }
    }
}

/// Outbound connection tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    /// TCP connect (dial) timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// Extra time allowed for the TLS handshake of `https` backends, in
    /// milliseconds. Connection setup as a whole is bounded by
    /// `connect_timeout_ms + tls_handshake_timeout_ms`.
    pub tls_handshake_timeout_ms: u64,

    /// TCP keep-alive interval in seconds.
    pub keepalive_secs: u64,

    /// How long an idle pooled connection is kept, in seconds.
    pub pool_idle_timeout_secs: u64,

    /// Maximum idle pooled connections per backend host.
    pub pool_max_idle_per_host: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 30_000,
            tls_handshake_timeout_ms: 10_000,
            keepalive_secs: 30,
            pool_idle_timeout_secs: 90,
            pool_max_idle_per_host: 100,
        }
    }
}

/// Response equivalence rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ComparisonConfig {
    /// Compare status codes at all.
    pub compare_status_code: bool,

    /// Groups of status codes considered interchangeable, e.g. `[[200, 201]]`.
    pub equivalent_status_codes: Vec<Vec<u16>>,

    /// Response headers whose ordered values must match.
    pub headers_include: Vec<String>,

    /// Compare response bodies.
    pub compare_body: bool,

    /// JSON pointer paths ignored when diffing bodies, e.g. `/timestamp`.
    pub bodies_exclude: Vec<String>,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            compare_status_code: true,
            equivalent_status_codes: Vec::new(),
            headers_include: vec!["Content-Type".to_string()],
            compare_body: true,
            bodies_exclude: Vec::new(),
        }
    }
}

/// Route templates.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RoutesConfig {
    /// Ordered regular expressions; the first match names the route.
    /// Patterns are not anchored implicitly.
    pub path_patterns: Vec<String>,
}

/// Replay log configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Entries kept per (route, outcome) key.
    pub max_entries_per_key: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            max_entries_per_key: 20,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Serve the admin/debug router.
    pub enabled: bool,

    /// Bearer token. When unset the endpoints are unauthenticated.
    pub api_key: Option<String>,

    /// Admin router bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            bind_address: "127.0.0.1:18081".to_string(),
        }
    }
}
