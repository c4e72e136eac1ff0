//! Handler and middleware traits, and their composition.

use std::fmt;
use std::sync::Arc;

use crate::context::Ctx;
use crate::error::Result;

/// Terminal request handler.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, ctx: &mut Ctx) -> Result<()>;
}

impl<F> Handler for F
where
    F: Fn(&mut Ctx) -> Result<()> + Send + Sync + 'static,
{
    fn call(&self, ctx: &mut Ctx) -> Result<()> {
        self(ctx)
    }
}

/// A request-intercepting stage.
///
/// A stage either calls `next` to delegate or returns without calling it,
/// in which case it owns the response for this request.
pub trait Middleware: Send + Sync + 'static {
    fn call(&self, ctx: &mut Ctx, next: &dyn Handler) -> Result<()>;
}

impl<F> Middleware for F
where
    F: Fn(&mut Ctx, &dyn Handler) -> Result<()> + Send + Sync + 'static,
{
    fn call(&self, ctx: &mut Ctx, next: &dyn Handler) -> Result<()> {
        self(ctx, next)
    }
}

/// One composed layer: a stage and everything inside it.
struct Stage {
    middleware: Arc<dyn Middleware>,
    next: Arc<dyn Handler>,
}

impl Handler for Stage {
    fn call(&self, ctx: &mut Ctx) -> Result<()> {
        self.middleware.call(ctx, self.next.as_ref())
    }
}

/// Ordered list of middleware stages.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    stages: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage; it runs inside every stage added before it.
    pub fn push(&mut self, middleware: impl Middleware) {
        self.stages.push(Arc::new(middleware));
    }

    pub fn push_arc(&mut self, middleware: Arc<dyn Middleware>) {
        self.stages.push(middleware);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Nest the stages around `terminal`, first stage outermost.
    pub fn build(&self, terminal: Arc<dyn Handler>) -> Arc<dyn Handler> {
        self.stages.iter().rev().fold(terminal, |next, middleware| {
            Arc::new(Stage {
                middleware: Arc::clone(middleware),
                next,
            })
        })
    }
}

impl fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("stages", &self.stages.len())
            .finish()
    }
}
