//! Request logging stage.

use std::time::Instant;

use log::{debug, info, warn};

use crate::parser::HttpRequest;
use crate::pipeline::middleware::{BoxFuture, Middleware, Next};
use crate::pipeline::HandlerResult;
use crate::server::Error;

/// Logs every request on the way in and its duration on the way out.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestLogger;

impl Middleware for RequestLogger {
    fn name(&self) -> &'static str {
        "logger"
    }

    fn process(&self, request: HttpRequest, next: Next) -> BoxFuture<'_, Result<HandlerResult, Error>> {
        Box::pin(async move {
            let method = request.method;
            let path = request.path.clone();
            info!("Request: {method} {path}");
            debug!(
                "Request {method} {path}: version={}, headers={}, body={} bytes",
                request.version,
                request.headers.len(),
                request.body.len()
            );

            let started = Instant::now();
            let result = next.run(request).await;
            let elapsed = started.elapsed();

            match &result {
                Ok(value) => debug!("{method} {path} returned {} in {elapsed:?}", value.kind()),
                Err(e) => warn!("{method} {path} failed after {elapsed:?}: {e}"),
            }

            result
        })
    }
}
