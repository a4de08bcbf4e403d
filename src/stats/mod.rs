//! Comparison statistics.
//!
//! # Data Flow
//! ```text
//! (route key, Outcome)
//!     → route_stats.rs (lazy per-route entry, atomic counters,
//!                       last example per mismatch kind)
//!     → snapshot_all() → admin /debug/stats, shadow-cli
//! ```
//!
//! Statistics live in memory only and reset on restart.

pub mod route_stats;

pub use route_stats::{DifferenceExample, RouteStatistics, RouteStatsEntry, RouteStatsSnapshot};
