//! Backend subsystem.
//!
//! # Data Flow
//! ```text
//! RequestSnapshot (tagged copy)
//!     → upstream.rs (rewrite URI onto base URL, strip hop-by-hop headers)
//!     → transport.rs (pooled hyper-util client, dial/keep-alive/idle tuning)
//!     → CapturedResponse, or UpstreamError if the backend was unreachable
//! ```
//!
//! # Design Decisions
//! - Exactly two backends, fixed at startup; no load balancing
//! - No retries and no fail-over: an unreachable backend is reported
//! - Both backends share one connection pool

pub mod transport;
pub mod upstream;

pub use transport::{build_client, HttpClient, TransportError};
pub use upstream::{Backend, BackendRole, UpstreamError};
