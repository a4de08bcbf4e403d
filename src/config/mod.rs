//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, with ${ENV:default} placeholders)
//!     → loader.rs (resolve env, parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → compiled into service objects at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdminConfig, BackendsConfig, ComparisonConfig, ListenerConfig, ObservabilityConfig,
    ProxyConfig, ReplayConfig, RoutesConfig, TransportConfig,
};
