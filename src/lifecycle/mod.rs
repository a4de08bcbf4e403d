//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     broadcast → proxy listener + admin listener stop accepting
//!              → in-flight requests drain → exit
//! ```
//!
//! Comparison tasks still running at exit are dropped; their outcomes are
//! never recorded.

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
