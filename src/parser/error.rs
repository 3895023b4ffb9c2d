//! Request parsing failures.

use thiserror::Error;

/// Why a request head could not be turned into an [`HttpRequest`](super::HttpRequest).
///
/// Every variant maps to `400 Bad Request` at the server boundary.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// The request target is empty.
    #[error("Invalid request target")]
    InvalidPath,

    #[error("Malformed request line: {0}")]
    MalformedRequestLine(String),

    #[error("Invalid HTTP version: {0}")]
    InvalidVersion(String),

    #[error("Missing header: {0}")]
    MissingHeader(String),

    /// A header line without a `:` separator.
    #[error("Invalid header line")]
    InvalidHeaderFormat,

    #[error("Invalid Content-Length: {0}")]
    InvalidContentLength(String),

    #[error("Empty request")]
    EmptyRequest,

    /// The body was declared as JSON but did not decode.
    #[error("Invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
}
