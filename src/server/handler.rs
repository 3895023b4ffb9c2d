//! Route handler types.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::parser::{HttpRequest, Method};
use crate::pipeline::HandlerResult;
use crate::server::Error;

/// Type alias for a boxed future that returns a Result<HandlerResult, Error>.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<HandlerResult, Error>> + Send>>;

/// Type alias for a handler function that takes an HttpRequest and returns a HandlerFuture.
pub type HandlerFn = Arc<dyn Fn(HttpRequest) -> HandlerFuture + Send + Sync>;

/// Box an async function as a [`HandlerFn`].
///
/// The function may return anything convertible into a [`HandlerResult`],
/// so `async { Ok("<h1>hi</h1>") }` and `async { Ok(404_u16) }` both work.
pub fn handler_fn<F, Fut, R>(handler: F) -> HandlerFn
where
    F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, Error>> + Send + 'static,
    R: Into<HandlerResult>,
{
    Arc::new(move |request: HttpRequest| -> HandlerFuture {
        let fut = handler(request);
        Box::pin(async move { fut.await.map(Into::into) })
    })
}

/// Represents a route in the route table.
#[derive(Clone)]
pub struct Route {
    /// The path to match, without query string.
    pub path: String,
    /// The HTTP methods to match.
    pub methods: Vec<Method>,
    /// The handler function.
    pub handler: HandlerFn,
}
