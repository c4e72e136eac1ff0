//! Middleware subsystem.
//!
//! # Data Flow
//! ```text
//! Router::use_middleware(stage)   (setup time)
//!     → MiddlewareChain::push
//!     → snapshot rebuild: chain.build(route handler) per route
//!
//! Request:
//!     stage[0] → stage[1] → ... → handler
//!     any stage may return without calling next (short-circuit)
//! ```
//!
//! # Design Decisions
//! - Composition happens once per snapshot, never per request
//! - Stages are synchronous; errors are returned, not caught
//! - First-declared stage is outermost

pub mod chain;

pub use chain::{Handler, Middleware, MiddlewareChain};
