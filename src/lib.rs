//! quick-router: HTTP routing library.
//!
//! Pattern-compiled routes (`:param`, `{regex}`, `{name:regex}`), first-match
//! dispatch per method, an ordered middleware chain, a per-request [`Ctx`]
//! and a JWT middleware with a configurable credential extraction chain.

pub mod auth;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod middleware;
pub mod observability;
pub mod routing;

pub use auth::{Claims, Extractor, JwtAuth, JwtConfig, KeySet};
pub use config::ServerConfig;
pub use context::Ctx;
pub use error::{Error, Result};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use middleware::{Handler, Middleware};
pub use routing::Router;
