//! Middleware stages and chain composition.
//!
//! A stage receives the request and a [`Next`] handle for everything inside
//! it. It may work on the request, call `next.run(request)` and work on the
//! returned value, or answer on its own without calling `next` at all.
//!
//! ```ignore
//! struct Timing;
//!
//! impl Middleware for Timing {
//!     fn name(&self) -> &'static str {
//!         "timing"
//!     }
//!
//!     fn process(&self, request: HttpRequest, next: Next) -> BoxFuture<'_, Result<HandlerResult, Error>> {
//!         Box::pin(async move {
//!             let started = std::time::Instant::now();
//!             let result = next.run(request).await;
//!             log::debug!("took {:?}", started.elapsed());
//!             result
//!         })
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::parser::HttpRequest;
use crate::pipeline::HandlerResult;
use crate::server::{Error, HandlerFn, HandlerFuture};

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One stage of the request pipeline.
///
/// Stages are built once and shared by every request, so they may only hold
/// state fixed at construction time.
pub trait Middleware: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Handle the request, usually by delegating to `next`.
    ///
    /// Errors from `next` should be returned unchanged.
    fn process(&self, request: HttpRequest, next: Next) -> BoxFuture<'_, Result<HandlerResult, Error>>;
}

/// The rest of the chain, as seen from one stage.
pub struct Next {
    endpoint: HandlerFn,
}

impl Next {
    /// Wrap an endpoint so it can be handed to a stage.
    pub fn new(endpoint: HandlerFn) -> Self {
        Self { endpoint }
    }

    /// Run the remaining stages and the handler. Consumes `self`, so a stage
    /// can delegate at most once.
    pub async fn run(self, request: HttpRequest) -> Result<HandlerResult, Error> {
        (self.endpoint)(request).await
    }
}

/// Compose `stages` around `terminal`, outermost first.
///
/// The list is folded from the last stage to the first, so stage `i` wraps the
/// already-composed stages `i+1..`. On the way in stages run in list order; on
/// the way out in reverse.
pub fn build_chain(stages: &[Arc<dyn Middleware>], terminal: HandlerFn) -> HandlerFn {
    stages.iter().rev().fold(terminal, |inner, stage| {
        let stage = Arc::clone(stage);
        let wrapped: HandlerFn = Arc::new(move |request: HttpRequest| -> HandlerFuture {
            let stage = Arc::clone(&stage);
            let next = Next::new(Arc::clone(&inner));
            Box::pin(async move { stage.process(request, next).await })
        });
        wrapped
    })
}
