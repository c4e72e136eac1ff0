//! Request context subsystem.
//!
//! # Data Flow
//! ```text
//! Router match (params bound)
//!     → ctx.rs (Ctx::new: request view + query parsing)
//!     → middleware stages and handler read/write the Ctx
//!     → response.rs (ResponseSink: one terminal write)
//!     → Ctx::into_response → transport
//! ```
//!
//! # Design Decisions
//! - One Ctx per request, owned by the task handling it (no locking)
//! - Response is buffered; the transport writes it once after the chain returns
//! - Writes after the terminal one are errors, not silent overwrites

pub mod ctx;
pub mod response;

pub use ctx::{
    Ctx, CONTENT_TYPE_APP_JSON, CONTENT_TYPE_APP_XML, CONTENT_TYPE_TEXT_PLAIN,
    CONTENT_TYPE_TEXT_XML,
};
pub use response::ResponseSink;
