//! HTTP front end.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum, timeout, request ID, tracing)
//!     → fallback handler (buffer body, spawn_blocking)
//!     → Router::handle
//!     → Response
//!
//! Tests:
//!     Router::test(..).send() → testing.rs → Router::handle → TestResponse
//! ```

pub mod server;
pub mod testing;

pub use server::{AppState, HttpServer};
pub use testing::{TestRequest, TestResponse};
