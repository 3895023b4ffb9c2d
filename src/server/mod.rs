//! HTTP transport and routing for microweb-rs.
//!
//! The server owns the sockets: it reads a request, hands it to the
//! [`Pipeline`](crate::pipeline::Pipeline), and writes back the response or
//! the error mapped to a status code.

mod response;
mod config;
mod error;
mod handler;
mod http_server;
mod router;
mod tests;

// Re-export public items
pub use response::{HttpResponse, StatusCode};
pub use config::ServerConfig;
pub use error::Error;
pub use handler::{handler_fn, HandlerFn, HandlerFuture, Route};
pub use http_server::{error_response, HttpServer};
pub use router::{RouteTable, RouteTableBuilder};
