//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! SIGTERM/SIGINT → Shutdown::trigger → every subscribed server drains and exits
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
