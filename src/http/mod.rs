//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → request.rs (buffer into an immutable snapshot, tagged copy)
//!     → [shadow pipeline forwards to both backends]
//!     → response.rs (captured responses, hop-by-hop filtering)
//!     → Send primary response to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, RequestSnapshot, X_REQUEST_ID};
pub use response::{CapturedBody, CapturedResponse};
pub use server::{AppState, HttpServer, ProxyError};
