//! Immutable dispatch table.
//!
//! # Responsibilities
//! - Store compiled routes per method, in registration order
//! - Look up the first route whose pattern matches a path
//! - Hold the middleware-composed pipeline for every route
//!
//! # Design Decisions
//! - A table is never mutated; registration builds a new one
//! - O(1) method lookup via HashMap, O(n) scan within a method
//! - First registered match wins, not the most specific one

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::http::Method;
use percent_encoding::percent_decode_str;

use crate::middleware::{Handler, MiddlewareChain};
use crate::routing::pattern::CompiledPattern;

/// A registered route.
pub struct Route {
    method: Method,
    pattern: CompiledPattern,
    handler: Arc<dyn Handler>,
    pipeline: Arc<dyn Handler>,
}

impl Route {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    /// Handler wrapped in the table's middleware chain.
    pub fn pipeline(&self) -> &Arc<dyn Handler> {
        &self.pipeline
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}

/// Result of a successful lookup.
#[derive(Debug)]
pub struct RouteMatch {
    pub route: Arc<Route>,
    pub params: HashMap<String, String>,
}

/// Snapshot of all routes and the middleware they run behind.
#[derive(Debug, Default, Clone)]
pub struct RouteTable {
    by_method: HashMap<Method, Vec<Arc<Route>>>,
    order: Vec<Arc<Route>>,
    middleware: MiddlewareChain,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of this table with one more route at the end.
    pub fn with_route(
        &self,
        method: Method,
        pattern: CompiledPattern,
        handler: Arc<dyn Handler>,
    ) -> Self {
        let route = Arc::new(Route {
            pipeline: self.middleware.build(Arc::clone(&handler)),
            method: method.clone(),
            pattern,
            handler,
        });
        let mut next = self.clone();
        next.by_method
            .entry(method)
            .or_default()
            .push(Arc::clone(&route));
        next.order.push(route);
        next
    }

    /// Copy of this table with a different middleware chain; every route's
    /// pipeline is recomposed.
    pub fn with_middleware(&self, middleware: MiddlewareChain) -> Self {
        let mut next = Self {
            middleware,
            ..Self::default()
        };
        for route in &self.order {
            next = next.with_route(
                route.method.clone(),
                route.pattern.clone(),
                Arc::clone(&route.handler),
            );
        }
        next
    }

    pub fn middleware(&self) -> &MiddlewareChain {
        &self.middleware
    }

    /// All routes in registration order.
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// First route for `method` whose pattern matches `path`.
    pub fn lookup(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        let decoded = percent_decode_str(path).decode_utf8_lossy();
        self.by_method.get(method)?.iter().find_map(|route| {
            if !decoded.starts_with(route.pattern.literal_prefix()) {
                return None;
            }
            route.pattern.match_path(path).map(|params| RouteMatch {
                route: Arc::clone(route),
                params,
            })
        })
    }
}
