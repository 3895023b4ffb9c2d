//! A minimal HTTP request pipeline.
//!
//! Requests are read by a small tokio server, passed through an ordered chain
//! of middleware stages, dispatched to a route handler, and the handler's
//! return value is normalized into a wire response.
//!
//! # Features
//!
//! - Composable middleware stages with pre- and post-processing
//! - Request logging, JSON and form body parsing
//! - Handlers return plain values (text, bytes, JSON documents, status codes,
//!   redirects, templates) instead of building responses by hand
//! - In-memory templates with filters, including relative-time formatting
//! - Per-request timeouts, connection limits and graceful shutdown
//!
//! # Examples
//!
//! ## Handlers returning plain values
//!
//! ```
//! use std::sync::Arc;
//! use microweb_rs::{HandlerResult, Method, Pipeline, RouteTable, Templates};
//! use serde_json::json;
//!
//! let routes = RouteTable::builder()
//!     .get("/", |_req| async { Ok("<h1>Home</h1>") })
//!     .get("/old", |_req| async { Ok("redirect:/") })
//!     .get("/api/status", |_req| async {
//!         HandlerResult::document(&json!({"status": "ok"}))
//!     })
//!     .route("/teapot", vec![Method::GET], |_req| async { Ok((418_u16, "short and stout")) })
//!     .build();
//!
//! let templates = Templates::new().with_template("hello.html", "<p>Hello, {{ name }}</p>");
//! let pipeline = Pipeline::standard(routes, Arc::new(templates));
//! assert_eq!(pipeline.stage_names(), ["logger", "body-parser", "response-normalizer"]);
//! ```
//!
//! ## Running one request
//!
//! ```
//! use std::sync::Arc;
//! use microweb_rs::{parse_request, Pipeline, RouteTable, Templates};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let routes = RouteTable::builder()
//!     .get("/old", |_req| async { Ok("redirect:/login") })
//!     .build();
//! let pipeline = Pipeline::standard(routes, Arc::new(Templates::new()));
//!
//! let request = parse_request(b"GET /old HTTP/1.1\r\nHost: example.com\r\n\r\n").unwrap();
//! let response = pipeline.handle(request).await.unwrap();
//! assert_eq!(response.status.as_u16(), 302);
//! assert_eq!(response.header("Location"), Some("/login"));
//! # });
//! ```
//!
//! See `demos/blog.rs` for a complete server.

pub mod parser;
pub mod pipeline;
pub mod server;
pub mod template;

// Re-export commonly used items for convenience
pub use parser::{Error as ParserError, HttpRequest, HttpVersion, Method, ParsedData, parse_request};
pub use pipeline::{
    build_chain, normalize, BodyParser, HandlerResult, Middleware, Next, Pipeline, RequestLogger,
    ResponseNormalizer,
};
pub use server::{Error as ServerError, HttpResponse, HttpServer, RouteTable, ServerConfig, StatusCode};
pub use template::{relative_time, Locale, RenderError, TemplateRenderer, Templates};
