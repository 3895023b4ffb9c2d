//! The route table.

use std::future::Future;
use std::sync::Arc;

use log::debug;

use crate::parser::{HttpRequest, Method};
use crate::pipeline::HandlerResult;
use crate::server::handler::{handler_fn, HandlerFn, HandlerFuture, Route};
use crate::server::Error;

/// Maps method and path to a handler.
///
/// Built once through [`RouteTableBuilder`] and never mutated afterwards, so
/// it can be shared between connections without locking.
#[derive(Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::default()
    }

    /// Find the handler for `method` on `path`.
    ///
    /// Any query string on `path` is ignored. Fails with
    /// [`Error::UnmappedRoute`] when nothing is registered for the path and
    /// with [`Error::MethodNotAllowed`] when the path exists under other
    /// methods only.
    pub fn lookup(&self, method: Method, path: &str) -> Result<&HandlerFn, Error> {
        let path = path.split_once('?').map_or(path, |(p, _)| p);
        let matching: Vec<&Route> = self.routes.iter().filter(|route| route.path == path).collect();

        if matching.is_empty() {
            return Err(Error::UnmappedRoute(path.to_string()));
        }

        matching
            .iter()
            .find(|route| route.methods.contains(&method))
            .map(|route| &route.handler)
            .ok_or_else(|| {
                let mut allowed: Vec<Method> = Vec::new();
                for m in matching.iter().flat_map(|route| route.methods.iter().copied()) {
                    if !allowed.contains(&m) {
                        allowed.push(m);
                    }
                }
                Error::MethodNotAllowed {
                    method,
                    path: path.to_string(),
                    allowed,
                }
            })
    }

    /// Registered routes, in registration order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// An endpoint that dispatches each request to its route's handler.
    ///
    /// This is the innermost element of every pipeline.
    pub fn dispatcher(table: Arc<RouteTable>) -> HandlerFn {
        Arc::new(move |request: HttpRequest| -> HandlerFuture {
            let found = table.lookup(request.method, request.route_path()).cloned();
            match found {
                Ok(handler) => {
                    debug!("Dispatching {} {}", request.method, request.route_path());
                    handler(request)
                }
                Err(e) => Box::pin(async move { Err(e) }),
            }
        })
    }
}

/// Collects routes for a [`RouteTable`].
#[derive(Default)]
pub struct RouteTableBuilder {
    routes: Vec<Route>,
}

impl RouteTableBuilder {
    /// Register an async handler for `path` under `methods`.
    ///
    /// When two routes share a path and method, the first one registered wins.
    pub fn route<F, Fut, R>(self, path: impl Into<String>, methods: Vec<Method>, handler: F) -> Self
    where
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, Error>> + Send + 'static,
        R: Into<HandlerResult>,
    {
        self.route_fn(path, methods, handler_fn(handler))
    }

    /// Register an already boxed handler.
    pub fn route_fn(mut self, path: impl Into<String>, methods: Vec<Method>, handler: HandlerFn) -> Self {
        self.routes.push(Route {
            path: path.into(),
            methods,
            handler,
        });
        self
    }

    /// Shorthand for a GET route.
    pub fn get<F, Fut, R>(self, path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, Error>> + Send + 'static,
        R: Into<HandlerResult>,
    {
        self.route(path, vec![Method::GET], handler)
    }

    /// Shorthand for a POST route.
    pub fn post<F, Fut, R>(self, path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, Error>> + Send + 'static,
        R: Into<HandlerResult>,
    {
        self.route(path, vec![Method::POST], handler)
    }

    pub fn build(self) -> RouteTable {
        RouteTable { routes: self.routes }
    }
}
