//! Error types for request handling.

use std::time::Duration;
use thiserror::Error;

use crate::parser::{Error as ParserError, Method};
use crate::server::response::StatusCode;
use crate::template::RenderError;

/// Errors raised while a request travels through the pipeline.
///
/// The pipeline never recovers from these; they unwind through every
/// middleware stage and are turned into a response by the server.
#[derive(Debug, Error)]
pub enum Error {
    /// Error parsing an HTTP request.
    #[error("Parse error: {0}")]
    ParseError(#[from] ParserError),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The body does not decode as its declared content type.
    #[error("Malformed {content_type} body: {reason}")]
    MalformedBody {
        content_type: &'static str,
        reason: String,
    },

    /// A template could not be rendered.
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// A structured document has no JSON representation.
    #[error("Serialization error: {0}")]
    Serialization(serde_json::Error),

    /// No route is registered for the path.
    #[error("Not found: {0}")]
    UnmappedRoute(String),

    /// The path is routed, but not for this method.
    #[error("Method {method} not allowed for path: {path}")]
    MethodNotAllowed {
        method: Method,
        path: String,
        allowed: Vec<Method>,
    },

    /// The peer closed the connection before the declared body arrived.
    #[error("Incomplete body: expected {expected} bytes, received {received}")]
    IncompleteBody { expected: usize, received: usize },

    /// The declared body exceeds the configured limit.
    #[error("Request body of {0} bytes exceeds the limit")]
    PayloadTooLarge(usize),

    /// The request did not complete within the configured time.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Internal server error.
    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl Error {
    /// The status the server answers with when this error reaches it.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::ParseError(_) | Error::MalformedBody { .. } | Error::IncompleteBody { .. } => {
                StatusCode::BAD_REQUEST
            }
            Error::UnmappedRoute(_) => StatusCode::NOT_FOUND,
            Error::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Error::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Error::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::IoError(_)
            | Error::Render(_)
            | Error::Serialization(_)
            | Error::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
