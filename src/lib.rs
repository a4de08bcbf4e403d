//! Shadowing reverse proxy library.
//!
//! Every inbound request is duplicated to a primary and a shadow backend;
//! the caller receives the primary response while the two responses are
//! compared in the background and divergences are recorded for replay.

// Core subsystems
pub mod backend;
pub mod config;
pub mod http;
pub mod pipeline;
pub mod routing;

// Comparison and recording
pub mod compare;
pub mod replay;
pub mod stats;

// Cross-cutting concerns
pub mod admin;
pub mod lifecycle;
pub mod observability;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use pipeline::ShadowPipeline;
