//! Routing subsystem.
//!
//! Routes here are aggregation buckets, not forwarding targets: every
//! request goes to both backends, and the route key only decides where its
//! statistics and replay entries are filed.
//!
//! # Data Flow
//! ```text
//! Incoming Request path
//!     → matcher.rs (ordered regex templates)
//!     → Route key (template, or the path itself)
//! ```
//!
//! # Design Decisions
//! - Templates compiled at startup, immutable at runtime
//! - Deterministic: same input always yields the same key
//! - First match wins (configured order)

pub mod matcher;

pub use matcher::{PathMatcher, PathPattern};
