//! Response normalization stage.
//!
//! Turns whatever the handler returned into a finished [`HttpResponse`]. The
//! rules are tried in a fixed order and the first match wins:
//!
//! | Result                         | Response                                          |
//! |--------------------------------|---------------------------------------------------|
//! | `Stream`                       | unchanged                                         |
//! | `Bytes`                        | `application/octet-stream`                        |
//! | `Text` starting `redirect:`    | `302 Found`, `Location` = rest of the text        |
//! |                                | (a target with CR or LF is an error)              |
//! | `Text`                         | `text/html;charset=utf-8`                         |
//! | `Document` with `__template__` | rendered template, `text/html;charset=utf-8`      |
//! |                                | (a null `__template__` counts as absent)          |
//! | `Document`                     | JSON, `application/json;charset=utf-8`            |
//! | `Status` in `100..600`         | bare status                                       |
//! | `StatusWithMessage` in range   | status with message, `text/plain;charset=utf-8`   |
//! | anything else                  | stringified, `text/plain;charset=utf-8`           |

use std::sync::Arc;

use log::debug;
use serde_json::{Map, Value};

use crate::parser::HttpRequest;
use crate::pipeline::middleware::{BoxFuture, Middleware, Next};
use crate::pipeline::HandlerResult;
use crate::server::{Error, HttpResponse, StatusCode};
use crate::template::{RenderError, TemplateRenderer};

/// Marks a `Text` result as a redirect.
pub const REDIRECT_PREFIX: &str = "redirect:";

/// Document key naming the template to render the rest of the document with.
pub const TEMPLATE_KEY: &str = "__template__";

const OCTET_STREAM: &str = "application/octet-stream";
const HTML: &str = "text/html;charset=utf-8";
const JSON: &str = "application/json;charset=utf-8";
const PLAIN: &str = "text/plain;charset=utf-8";

/// Normalizes the inner chain's result into [`HandlerResult::Stream`].
#[derive(Clone)]
pub struct ResponseNormalizer {
    renderer: Arc<dyn TemplateRenderer>,
}

impl ResponseNormalizer {
    pub fn new(renderer: Arc<dyn TemplateRenderer>) -> Self {
        Self { renderer }
    }
}

impl Middleware for ResponseNormalizer {
    fn name(&self) -> &'static str {
        "response-normalizer"
    }

    fn process(&self, request: HttpRequest, next: Next) -> BoxFuture<'_, Result<HandlerResult, Error>> {
        Box::pin(async move {
            let result = next.run(request).await?;
            debug!("Normalizing {} result", result.kind());
            normalize(result, self.renderer.as_ref()).map(HandlerResult::Stream)
        })
    }
}

/// Map a handler result to exactly one response.
///
/// Fails when a template cannot be rendered, a document cannot be serialized,
/// or a redirect target would break the header block.
pub fn normalize(result: HandlerResult, renderer: &dyn TemplateRenderer) -> Result<HttpResponse, Error> {
    match result {
        HandlerResult::Stream(response) => Ok(response),
        HandlerResult::Bytes(bytes) => Ok(HttpResponse::new(StatusCode::OK)
            .with_content_type(OCTET_STREAM)
            .with_body_bytes(bytes)),
        HandlerResult::Text(text) => match text.strip_prefix(REDIRECT_PREFIX) {
            Some(location) if location.contains(['\r', '\n']) => Err(Error::InternalError(format!(
                "redirect target contains a line break: {location:?}"
            ))),
            Some(location) => Ok(HttpResponse::redirect(location)),
            None => Ok(body(StatusCode::OK, HTML, text)),
        },
        HandlerResult::Document(mut document) => match document.remove(TEMPLATE_KEY) {
            None => json_document(&document),
            // A null template is the same as none; the key stays in the output
            Some(Value::Null) => {
                document.insert(TEMPLATE_KEY.to_string(), Value::Null);
                json_document(&document)
            }
            Some(Value::String(template)) => {
                let html = renderer.render(&template, &document)?;
                Ok(body(StatusCode::OK, HTML, html))
            }
            Some(other) => Err(RenderError::InvalidName(other.to_string()).into()),
        },
        HandlerResult::Status(code) => match StatusCode::from_i64(code) {
            Some(status) => Ok(HttpResponse::new(status)),
            None => Ok(body(StatusCode::OK, PLAIN, code.to_string())),
        },
        HandlerResult::StatusWithMessage(code, message) => match StatusCode::from_i64(code) {
            Some(status) => Ok(body(status, PLAIN, message)),
            None => Ok(body(StatusCode::OK, PLAIN, format!("({code}, {message})"))),
        },
        HandlerResult::Other(text) => Ok(body(StatusCode::OK, PLAIN, text)),
    }
}

fn json_document(document: &Map<String, Value>) -> Result<HttpResponse, Error> {
    let json = serde_json::to_vec(document).map_err(Error::Serialization)?;
    Ok(body(StatusCode::OK, JSON, json))
}

fn body(status: StatusCode, content_type: &str, bytes: impl Into<Vec<u8>>) -> HttpResponse {
    HttpResponse::new(status)
        .with_content_type(content_type)
        .with_body_bytes(bytes)
}
