//! The request pipeline.
//!
//! A [`Pipeline`] is an ordered list of [`Middleware`] stages folded around
//! route dispatch. The standard pipeline is
//!
//! ```text
//! RequestLogger -> BodyParser -> ResponseNormalizer -> route handler
//! ```
//!
//! Handlers return a [`HandlerResult`]; the normalizer turns it into an
//! [`HttpResponse`](crate::server::HttpResponse) on the way back out.

mod body;
mod logger;
mod middleware;
mod normalize;
mod result;

use std::sync::Arc;

use log::debug;

use crate::parser::HttpRequest;
use crate::server::{Error, HandlerFn, HttpResponse, RouteTable};
use crate::template::TemplateRenderer;

pub use body::{parse_body, BodyParser};
pub use logger::RequestLogger;
pub use middleware::{build_chain, BoxFuture, Middleware, Next};
pub use normalize::{normalize, ResponseNormalizer, REDIRECT_PREFIX, TEMPLATE_KEY};
pub use result::HandlerResult;

/// The composed request handler: stages, route table and template renderer.
///
/// Built once at startup and shared by every connection.
pub struct Pipeline {
    endpoint: HandlerFn,
    routes: Arc<RouteTable>,
    renderer: Arc<dyn TemplateRenderer>,
    stage_names: Vec<&'static str>,
}

impl Pipeline {
    /// Start building a pipeline around `routes`.
    pub fn builder(routes: RouteTable, renderer: Arc<dyn TemplateRenderer>) -> PipelineBuilder {
        PipelineBuilder {
            routes: Arc::new(routes),
            renderer,
            stages: Vec::new(),
        }
    }

    /// Logger, body parser and response normalizer, in that order.
    pub fn standard(routes: RouteTable, renderer: Arc<dyn TemplateRenderer>) -> Self {
        let normalizer = ResponseNormalizer::new(Arc::clone(&renderer));
        Self::builder(routes, renderer)
            .stage(RequestLogger)
            .stage(BodyParser)
            .stage(normalizer)
            .build()
    }

    /// Run one request through every stage and the matching handler.
    ///
    /// Whatever comes back is normalized here as well, so a pipeline without a
    /// [`ResponseNormalizer`] stage still yields a response.
    pub async fn handle(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        let result = (self.endpoint)(request).await?;
        normalize(result, self.renderer.as_ref())
    }

    /// The route table requests are dispatched against.
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Stage names, outermost first.
    pub fn stage_names(&self) -> &[&'static str] {
        &self.stage_names
    }
}

/// Collects stages for a [`Pipeline`].
pub struct PipelineBuilder {
    routes: Arc<RouteTable>,
    renderer: Arc<dyn TemplateRenderer>,
    stages: Vec<Arc<dyn Middleware>>,
}

impl PipelineBuilder {
    /// Append a stage. Stages added first run first on the way in.
    pub fn stage(mut self, stage: impl Middleware) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Fold the stages around route dispatch.
    pub fn build(self) -> Pipeline {
        let stage_names: Vec<&'static str> = self.stages.iter().map(|s| s.name()).collect();
        debug!("Building pipeline: {}", stage_names.join(" -> "));

        let endpoint = build_chain(&self.stages, RouteTable::dispatcher(Arc::clone(&self.routes)));
        Pipeline {
            endpoint,
            routes: self.routes,
            renderer: self.renderer,
            stage_names,
        }
    }
}
