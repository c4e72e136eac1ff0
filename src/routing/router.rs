//! Route registration and request dispatch.
//!
//! # Responsibilities
//! - Compile and register (method, pattern, handler) entries
//! - Publish each change as a new immutable [`RouteTable`] snapshot
//! - Dispatch a request: match, build the Ctx, run the pipeline, respond
//!
//! # Design Decisions
//! - Snapshots are swapped atomically (ArcSwap), so dispatch never locks
//! - Registration normally completes before serving; late registration is
//!   safe but only affects requests that load the new snapshot
//! - A per-request failure always resolves to a response

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use axum::http::{header, HeaderValue, Method, Request, Response, StatusCode};
use bytes::Bytes;

use crate::context::{Ctx, CONTENT_TYPE_TEXT_PLAIN};
use crate::error::Result;
use crate::middleware::{Handler, Middleware, MiddlewareChain};
use crate::observability::metrics;
use crate::routing::pattern::compile;
use crate::routing::table::{RouteMatch, RouteTable};

/// Body of the response sent when no route matches.
pub const NOT_FOUND_BODY: &str = "404 page not found";

/// (method, pattern) pair describing a registered route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    pub method: Method,
    pub pattern: String,
}

/// HTTP router: dispatch table plus middleware chain.
pub struct Router {
    table: ArcSwap<RouteTable>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self {
            table: ArcSwap::from_pointee(RouteTable::new()),
        }
    }

    /// Register `handler` for `method` requests matching `pattern`.
    pub fn register(&self, method: Method, pattern: &str, handler: impl Handler) -> Result<()> {
        let compiled = compile(pattern)?;
        let handler: Arc<dyn Handler> = Arc::new(handler);
        self.table.rcu(|table| {
            table.with_route(method.clone(), compiled.clone(), Arc::clone(&handler))
        });
        tracing::info!(method = %method, pattern = %pattern, "Route registered");
        Ok(())
    }

    pub fn get(&self, pattern: &str, handler: impl Handler) -> Result<()> {
        self.register(Method::GET, pattern, handler)
    }

    pub fn post(&self, pattern: &str, handler: impl Handler) -> Result<()> {
        self.register(Method::POST, pattern, handler)
    }

    pub fn put(&self, pattern: &str, handler: impl Handler) -> Result<()> {
        self.register(Method::PUT, pattern, handler)
    }

    pub fn delete(&self, pattern: &str, handler: impl Handler) -> Result<()> {
        self.register(Method::DELETE, pattern, handler)
    }

    pub fn patch(&self, pattern: &str, handler: impl Handler) -> Result<()> {
        self.register(Method::PATCH, pattern, handler)
    }

    pub fn head(&self, pattern: &str, handler: impl Handler) -> Result<()> {
        self.register(Method::HEAD, pattern, handler)
    }

    pub fn options(&self, pattern: &str, handler: impl Handler) -> Result<()> {
        self.register(Method::OPTIONS, pattern, handler)
    }

    /// Append a middleware stage wrapping every route, including routes
    /// registered earlier.
    pub fn use_middleware(&self, middleware: impl Middleware) {
        let middleware: Arc<dyn Middleware> = Arc::new(middleware);
        self.table.rcu(|table| {
            let mut chain: MiddlewareChain = table.middleware().clone();
            chain.push_arc(Arc::clone(&middleware));
            table.with_middleware(chain)
        });
        tracing::debug!(stages = self.table.load().middleware().len(), "Middleware added");
    }

    /// Registered routes in registration order.
    pub fn routes(&self) -> Vec<RouteInfo> {
        self.table
            .load()
            .routes()
            .iter()
            .map(|r| RouteInfo {
                method: r.method().clone(),
                pattern: r.pattern().as_str().to_string(),
            })
            .collect()
    }

    /// Current snapshot of the dispatch table.
    pub fn snapshot(&self) -> Arc<RouteTable> {
        self.table.load_full()
    }

    /// Find the route for `method` and `path` without running it.
    pub fn dispatch(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.table.load().lookup(method, path)
    }

    /// Handle one fully buffered request.
    pub fn handle(&self, request: Request<Bytes>) -> Response<Bytes> {
        let start = Instant::now();
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let Some(RouteMatch { route, params }) = self.dispatch(&method, &path) else {
            tracing::warn!(method = %method, path = %path, "No route matched");
            metrics::record_request(method.as_str(), StatusCode::NOT_FOUND.as_u16(), "none", start);
            return not_found();
        };

        tracing::debug!(
            method = %method,
            path = %path,
            pattern = %route.pattern(),
            "Route matched"
        );

        let mut ctx = Ctx::new(request, params);
        if let Err(err) = route.pipeline().call(&mut ctx) {
            tracing::error!(
                method = %method,
                path = %path,
                error = %err,
                "Handler failed"
            );
            ctx.recover(&err);
        }

        let response = ctx.into_response();
        metrics::record_request(
            method.as_str(),
            response.status().as_u16(),
            route.pattern().as_str(),
            start,
        );
        response
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.table.load().len())
            .finish()
    }
}

fn not_found() -> Response<Bytes> {
    let mut response = Response::new(Bytes::from_static(NOT_FOUND_BODY.as_bytes()));
    *response.status_mut() = StatusCode::NOT_FOUND;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(CONTENT_TYPE_TEXT_PLAIN),
    );
    response
}
