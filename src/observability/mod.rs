//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request handling and comparison tasks produce:
//!     → logging.rs (structured log events, request ID in fields)
//!     → metrics.rs (comparison counters)
//!
//! Consumers:
//!     → stdout
//!     → Prometheus scrape endpoint
//! ```

pub mod logging;
pub mod metrics;
