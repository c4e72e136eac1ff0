//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (usually at startup):
//!     (method, pattern, handler)
//!     → pattern.rs (compile segments, anchor regexes)
//!     → table.rs (append to per-method list, wrap in middleware)
//!     → router.rs (publish new immutable snapshot)
//!
//! Dispatch (per request):
//!     method + path
//!     → router.rs (load snapshot)
//!     → table.rs (first matching route for the method)
//!     → pattern.rs (bind parameters)
//!     → query.rs (decode query string)
//!     → pipeline → Ctx → response
//! ```
//!
//! # Design Decisions
//! - First registered match wins (no specificity ranking)
//! - Segment counts must be equal; there are no wildcards
//! - Unknown method or path resolves to 404 without running middleware

pub mod pattern;
pub mod query;
pub mod router;
pub mod table;

pub use pattern::{compile, CompiledPattern, PatternError, Segment};
pub use query::parse_query;
pub use router::{RouteInfo, Router, NOT_FOUND_BODY};
pub use table::{Route, RouteMatch, RouteTable};
