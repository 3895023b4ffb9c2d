//! A small blog server showing every kind of handler result.
//!
//! Run with `RUST_LOG=debug cargo run --example blog` and try:
//!
//! ```text
//! curl -i http://127.0.0.1:9000/
//! curl -i http://127.0.0.1:9000/api/blogs
//! curl -i -X POST -H 'Content-Type: application/json' -d '{"title":"Hi"}' http://127.0.0.1:9000/api/blogs
//! curl -i http://127.0.0.1:9000/signout
//! ```

use std::sync::Arc;

use microweb_rs::{
    HandlerResult, HttpRequest, HttpResponse, HttpServer, Method, Pipeline, RouteTable, ServerConfig, ServerError,
    StatusCode, Templates,
};
use serde::Serialize;
use serde_json::{json, Map};

#[derive(Serialize)]
struct Blog {
    id: u32,
    title: String,
    created_at: i64,
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn blogs() -> Vec<Blog> {
    vec![
        Blog { id: 1, title: "Hello, world".to_string(), created_at: now() - 120 },
        Blog { id: 2, title: "Middleware in Rust".to_string(), created_at: now() - 3 * 86_400 },
        Blog { id: 3, title: "An old post".to_string(), created_at: now() - 30 * 86_400 },
    ]
}

async fn index(_req: HttpRequest) -> Result<HandlerResult, ServerError> {
    let mut context = Map::new();
    let first = &blogs()[0];
    context.insert("title".to_string(), json!(first.title));
    context.insert("created_at".to_string(), json!(first.created_at));
    Ok(HandlerResult::template("index.html", context))
}

async fn list_blogs(_req: HttpRequest) -> Result<HandlerResult, ServerError> {
    HandlerResult::document(&json!({ "blogs": blogs() }))
}

async fn create_blog(req: HttpRequest) -> Result<HandlerResult, ServerError> {
    let title = req
        .parsed_data
        .as_ref()
        .and_then(|data| data.get("title"))
        .and_then(|value| value.as_str().map(str::to_string));

    match title {
        Some(title) if !title.trim().is_empty() => {
            HandlerResult::document(&Blog { id: 4, title, created_at: now() })
        }
        _ => Ok(HandlerResult::from((400_u16, "title is required"))),
    }
}

async fn robots(_req: HttpRequest) -> Result<HttpResponse, ServerError> {
    Ok(HttpResponse::new(StatusCode::OK)
        .with_content_type("text/plain")
        .with_body_string("User-agent: *\nDisallow: /manage/\n"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let templates = Templates::new().with_template(
        "index.html",
        "<html><body><h1>{{ title }}</h1><p>posted {{ created_at|datetime }}</p></body></html>",
    );

    let routes = RouteTable::builder()
        .get("/", index)
        .get("/api/blogs", list_blogs)
        .post("/api/blogs", create_blog)
        .get("/robots.txt", robots)
        .get("/signout", |_req| async { Ok("redirect:/") })
        .get("/favicon.ico", |_req| async { Ok(204_u16) })
        .route("/version", vec![Method::GET, Method::HEAD], |_req| async {
            Ok(HandlerResult::other(env!("CARGO_PKG_VERSION")))
        })
        .build();

    let pipeline = Pipeline::standard(routes, Arc::new(templates));
    let server = HttpServer::new(ServerConfig::default(), pipeline);
    server.start().await?;

    Ok(())
}
