//! Values returned by route handlers.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::server::{Error, HttpResponse};

/// What a route handler hands back before it is turned into a response.
///
/// Exactly one variant is active; the response normalizer maps each one to a
/// concrete [`HttpResponse`]. Handlers usually build these through the
/// `From` conversions, e.g. returning `"redirect:/login".into()` or
/// `404_u16.into()`.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerResult {
    /// A finished response, passed through untouched.
    Stream(HttpResponse),
    /// An opaque binary payload.
    Bytes(Vec<u8>),
    /// An HTML page, or a redirect when it starts with `redirect:`.
    Text(String),
    /// A JSON document, or a template context when it holds `__template__`.
    Document(Map<String, Value>),
    /// A bare status code. Only `100..600` counts as a status.
    Status(i64),
    /// A status code with a plain-text message.
    StatusWithMessage(i64, String),
    /// Anything else, already stringified.
    Other(String),
}

impl HandlerResult {
    /// A `Text` result that redirects to `location`.
    pub fn redirect(location: impl AsRef<str>) -> Self {
        HandlerResult::Text(format!("{}{}", super::normalize::REDIRECT_PREFIX, location.as_ref()))
    }

    /// A `Document` built from any value that serializes to a JSON object.
    pub fn document<T: Serialize>(value: &T) -> Result<Self, Error> {
        match serde_json::to_value(value).map_err(Error::Serialization)? {
            Value::Object(map) => Ok(HandlerResult::Document(map)),
            other => Err(Error::Serialization(serde::ser::Error::custom(format!(
                "expected a JSON object, got {other}"
            )))),
        }
    }

    /// A `Document` that renders `template` with the given context.
    pub fn template(template: impl Into<String>, context: Map<String, Value>) -> Self {
        let mut document = context;
        document.insert(
            super::normalize::TEMPLATE_KEY.to_string(),
            Value::String(template.into()),
        );
        HandlerResult::Document(document)
    }

    /// The fallback variant, holding the value's `Display` form.
    pub fn other(value: impl fmt::Display) -> Self {
        HandlerResult::Other(value.to_string())
    }

    /// Short name of the active variant, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            HandlerResult::Stream(_) => "stream",
            HandlerResult::Bytes(_) => "bytes",
            HandlerResult::Text(_) => "text",
            HandlerResult::Document(_) => "document",
            HandlerResult::Status(_) => "status",
            HandlerResult::StatusWithMessage(_, _) => "status-with-message",
            HandlerResult::Other(_) => "other",
        }
    }
}

impl From<HttpResponse> for HandlerResult {
    fn from(response: HttpResponse) -> Self {
        HandlerResult::Stream(response)
    }
}

impl From<Vec<u8>> for HandlerResult {
    fn from(bytes: Vec<u8>) -> Self {
        HandlerResult::Bytes(bytes)
    }
}

impl From<&[u8]> for HandlerResult {
    fn from(bytes: &[u8]) -> Self {
        HandlerResult::Bytes(bytes.to_vec())
    }
}

impl From<String> for HandlerResult {
    fn from(text: String) -> Self {
        HandlerResult::Text(text)
    }
}

impl From<&str> for HandlerResult {
    fn from(text: &str) -> Self {
        HandlerResult::Text(text.to_string())
    }
}

impl From<Map<String, Value>> for HandlerResult {
    fn from(document: Map<String, Value>) -> Self {
        HandlerResult::Document(document)
    }
}

impl From<u16> for HandlerResult {
    fn from(code: u16) -> Self {
        HandlerResult::Status(i64::from(code))
    }
}

impl From<i32> for HandlerResult {
    fn from(code: i32) -> Self {
        HandlerResult::Status(i64::from(code))
    }
}

impl From<i64> for HandlerResult {
    fn from(code: i64) -> Self {
        HandlerResult::Status(code)
    }
}

impl<M: fmt::Display> From<(u16, M)> for HandlerResult {
    fn from((code, message): (u16, M)) -> Self {
        HandlerResult::StatusWithMessage(i64::from(code), message.to_string())
    }
}

impl<M: fmt::Display> From<(i32, M)> for HandlerResult {
    fn from((code, message): (i32, M)) -> Self {
        HandlerResult::StatusWithMessage(i64::from(code), message.to_string())
    }
}

impl<M: fmt::Display> From<(i64, M)> for HandlerResult {
    fn from((code, message): (i64, M)) -> Self {
        HandlerResult::StatusWithMessage(code, message.to_string())
    }
}
