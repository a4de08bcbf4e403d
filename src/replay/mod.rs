//! Replay log of divergent requests.
//!
//! # Data Flow
//! ```text
//! (route key, outcome label, original RequestSnapshot)
//!     → curl.rs (shell command reproducing the request)
//!     → log.rs (bounded FIFO per route and outcome)
//!     → admin /debug/errors, shadow-cli errors
//! ```

pub mod curl;
pub mod log;

pub use curl::to_curl;
pub use log::{ReplayLog, ReplayRecord};
