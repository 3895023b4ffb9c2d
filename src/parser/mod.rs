//! HTTP request parsing module.
//!
//! Turns the bytes read by the transport into an [`HttpRequest`]: request
//! line, headers, query parameters and the raw body. The body is left
//! undecoded here; the body-parser middleware fills in [`ParsedData`].

mod data;
mod request;
mod method;
mod version;
mod error;
mod tests;

// Re-export public items
pub use data::ParsedData;
pub use request::HttpRequest;
pub use method::Method;
pub use version::HttpVersion;
pub use error::Error;

// Re-export the parsing entry points
pub use request::{find_head_end, parse_request};
