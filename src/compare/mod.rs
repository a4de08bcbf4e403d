//! Response comparison subsystem.
//!
//! # Data Flow
//! ```text
//! (primary exchange, shadow exchange)
//!     → comparator.rs (availability → status → headers → body)
//!     → json_diff.rs (structural diff with JSON pointer paths)
//!     → outcome.rs (Identical | Mismatch { kind, message, details })
//! ```
//!
//! # Design Decisions
//! - Rules are read-only after startup; comparing needs no locking
//! - Short-circuit on the first failing check
//! - Failures are never reported as identical

pub mod comparator;
pub mod json_diff;
pub mod outcome;

pub use comparator::{Comparator, StatusEquivalence};
pub use json_diff::{DiffOp, DiffType};
pub use outcome::{Mismatch, MismatchKind, Outcome, IDENTICAL_LABEL};
