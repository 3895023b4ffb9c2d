//! Tests for the HTTP server, route table and responses.

#[cfg(test)]
mod server_tests {
    use std::io::{self, Cursor};
    use std::pin::Pin;
    use std::sync::Arc;
    use std::task::{Context, Poll};
    use std::time::Duration;
    use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

    use crate::parser::{HttpRequest, Method};
    use crate::pipeline::{HandlerResult, Pipeline};
    use crate::server::{error_response, Error, HttpResponse, HttpServer, RouteTable, ServerConfig, StatusCode};
    use crate::template::Templates;

    // Mock TcpStream for testing
    struct MockTcpStream {
        read_data: Cursor<Vec<u8>>,
        write_data: Vec<u8>,
        max_read: usize,
    }

    impl MockTcpStream {
        fn new(read_data: Vec<u8>) -> Self {
            Self {
                read_data: Cursor::new(read_data),
                write_data: Vec::new(),
                max_read: usize::MAX,
            }
        }

        /// Hand out at most `max_read` bytes per read, like a slow peer.
        fn trickle(read_data: Vec<u8>, max_read: usize) -> Self {
            Self { max_read, ..Self::new(read_data) }
        }

        fn written(&self) -> String {
            String::from_utf8_lossy(&self.write_data).into_owned()
        }
    }

    impl AsyncRead for MockTcpStream {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            let this = self.get_mut();
            let unfilled = buf.initialize_unfilled();
            let limit = unfilled.len().min(this.max_read);
            let n = std::io::Read::read(&mut this.read_data, &mut unfilled[..limit])?;
            buf.advance(n);
            Poll::Ready(Ok(()))
        }
    }

    impl AsyncWrite for MockTcpStream {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            let this = self.get_mut();
            this.write_data.extend_from_slice(buf);
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    /// A peer that never sends anything.
    struct SilentStream {
        write_data: Vec<u8>,
    }

    impl AsyncRead for SilentStream {
        fn poll_read(self: Pin<&mut Self>, _cx: &mut Context<'_>, _buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
            Poll::Pending
        }
    }

    impl AsyncWrite for SilentStream {
        fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
            self.get_mut().write_data.extend_from_slice(buf);
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    fn test_pipeline() -> Pipeline {
        let routes = RouteTable::builder()
            .get("/test", |_req| async { Ok("Test response") })
            .route("/multi", vec![Method::GET, Method::POST], |req: HttpRequest| async move {
                match req.method {
                    Method::GET => Ok(HandlerResult::from("GET response")),
                    Method::POST => Ok(HandlerResult::from((201_u16, "POST response"))),
                    _ => Err(Error::InternalError("Unexpected method".to_string())),
                }
            })
            .post("/echo", |req: HttpRequest| async move {
                let data = req.parsed_data.map(|d| d.to_value());
                HandlerResult::document(&serde_json::json!({ "data": data }))
            })
            .get("/page", |_req| async {
                Ok(HandlerResult::template("missing.html", serde_json::Map::new()))
            })
            .build();
        Pipeline::standard(routes, Arc::new(Templates::new()))
    }

    async fn exchange(raw: &[u8], config: &ServerConfig) -> (Result<(), Error>, String) {
        let mut stream = MockTcpStream::new(raw.to_vec());
        let result = HttpServer::handle_connection(&mut stream, &test_pipeline(), config).await;
        (result, stream.written())
    }

    #[test]
    fn test_status_code_range() {
        assert_eq!(StatusCode::from_u16(100).map(|s| s.as_u16()), Some(100));
        assert_eq!(StatusCode::from_u16(599).map(|s| s.as_u16()), Some(599));
        assert!(StatusCode::from_u16(99).is_none());
        assert!(StatusCode::from_u16(600).is_none());
        assert!(StatusCode::from_i64(-200).is_none());
        assert!(StatusCode::from_i64(65_736).is_none());
        assert_eq!(StatusCode::from_u16(599).unwrap().reason_phrase(), "Unknown");
        assert_eq!(StatusCode::NOT_FOUND.to_string(), "404 Not Found");
    }

    #[test]
    fn test_http_response_to_bytes() {
        let response = HttpResponse::new(StatusCode::OK)
            .with_content_type("text/plain")
            .with_body_string("Hello, world!");

        let response_str = String::from_utf8_lossy(&response.to_bytes()).into_owned();

        assert!(response_str.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response_str.contains("Content-Type: text/plain\r\n"));
        assert!(response_str.contains("Content-Length: 13\r\n"));
        assert!(response_str.contains("Server: microweb-rs\r\n"));
        assert!(response_str.ends_with("\r\n\r\nHello, world!"));
    }

    #[test]
    fn test_redirect_response() {
        let response = HttpResponse::redirect("/login");
        let text = String::from_utf8_lossy(&response.to_bytes()).into_owned();
        assert!(text.starts_with("HTTP/1.1 302 Found\r\n"));
        assert!(text.contains("Location: /login\r\n"));
        assert!(text.contains("Content-Length: 0\r\n"));
    }

    #[test]
    fn test_with_json() {
        let response = HttpResponse::new(StatusCode::OK)
            .with_json(&serde_json::json!({"ok": true}))
            .unwrap();
        assert_eq!(response.content_type(), Some("application/json;charset=utf-8"));
        assert_eq!(response.body, br#"{"ok":true}"#);
    }

    #[test]
    fn test_route_lookup() {
        let table = RouteTable::builder()
            .get("/a", |_req| async { Ok("a") })
            .post("/a", |_req| async { Ok("a2") })
            .route("/b", vec![Method::PUT, Method::PATCH], |_req| async { Ok("b") })
            .build();

        assert_eq!(table.len(), 3);
        assert!(table.lookup(Method::GET, "/a").is_ok());
        assert!(table.lookup(Method::POST, "/a?x=1").is_ok());
        assert!(matches!(table.lookup(Method::GET, "/c"), Err(Error::UnmappedRoute(ref p)) if p == "/c"));

        match table.lookup(Method::DELETE, "/a") {
            Err(Error::MethodNotAllowed { method, path, allowed }) => {
                assert_eq!(method, Method::DELETE);
                assert_eq!(path, "/a");
                assert_eq!(allowed, vec![Method::GET, Method::POST]);
            }
            _ => panic!("expected MethodNotAllowed"),
        }
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(Error::UnmappedRoute("/".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(Error::PayloadTooLarge(10).status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(Error::Timeout(Duration::from_secs(1)).status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            Error::MalformedBody { content_type: "application/json", reason: "eof".into() }.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(Error::InternalError("x".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            Error::IncompleteBody { expected: 10, received: 3 }.status_code(),
            StatusCode::BAD_REQUEST
        );

        let response = error_response(&Error::MethodNotAllowed {
            method: Method::PUT,
            path: "/a".into(),
            allowed: vec![Method::GET, Method::HEAD],
        });
        assert_eq!(response.header("Allow"), Some("GET, HEAD"));
    }

    #[tokio::test]
    async fn test_handle_connection_with_valid_request() {
        let (result, response) = exchange(b"GET /test HTTP/1.1\r\nHost: localhost\r\n\r\n", &ServerConfig::default()).await;

        assert!(result.is_ok());
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("Content-Type: text/html;charset=utf-8\r\n"));
        assert!(response.ends_with("Test response"));
    }

    #[tokio::test]
    async fn test_handle_connection_with_not_found() {
        let (result, response) = exchange(b"GET /nonexistent HTTP/1.1\r\nHost: localhost\r\n\r\n", &ServerConfig::default()).await;

        assert!(matches!(result, Err(Error::UnmappedRoute(_))));
        assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(response.contains("Not found: /nonexistent"));
    }

    #[tokio::test]
    async fn test_handle_connection_with_method_not_allowed() {
        let (result, response) = exchange(b"DELETE /test HTTP/1.1\r\nHost: localhost\r\n\r\n", &ServerConfig::default()).await;

        assert!(matches!(result, Err(Error::MethodNotAllowed { .. })));
        assert!(response.starts_with("HTTP/1.1 405 Method Not Allowed\r\n"));
        assert!(response.contains("Method DELETE not allowed for path: /test"));
        assert!(response.contains("Allow: GET\r\n"));
    }

    #[tokio::test]
    async fn test_handle_connection_with_invalid_request() {
        let (result, response) = exchange(b"INVALID REQUEST", &ServerConfig::default()).await;

        assert!(matches!(result, Err(Error::ParseError(_))));
        assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(response.contains("Error parsing request:"));
    }

    #[tokio::test]
    async fn test_handle_connection_with_empty_stream() {
        let (result, response) = exchange(b"", &ServerConfig::default()).await;
        assert!(result.is_ok());
        assert!(response.is_empty());
    }

    #[tokio::test]
    async fn test_route_with_multiple_methods() {
        let config = ServerConfig::default();

        let (get_result, get_response) = exchange(b"GET /multi HTTP/1.1\r\nHost: localhost\r\n\r\n", &config).await;
        assert!(get_result.is_ok());
        assert!(get_response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(get_response.contains("GET response"));

        let (post_result, post_response) = exchange(b"POST /multi HTTP/1.1\r\nHost: localhost\r\n\r\n", &config).await;
        assert!(post_result.is_ok());
        assert!(post_response.starts_with("HTTP/1.1 201 Created\r\n"));
        assert!(post_response.contains("Content-Type: text/plain;charset=utf-8\r\n"));
        assert!(post_response.contains("POST response"));
    }

    #[tokio::test]
    async fn test_body_read_across_chunks() {
        let body = br#"{"title":"Split across many reads"}"#;
        let mut raw = format!(
            "POST /echo HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n",
            body.len()
        )
        .into_bytes();
        raw.extend_from_slice(body);

        let mut stream = MockTcpStream::trickle(raw, 7);
        let result = HttpServer::handle_connection(&mut stream, &test_pipeline(), &ServerConfig::default()).await;

        assert!(result.is_ok());
        let response = stream.written();
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("Content-Type: application/json;charset=utf-8\r\n"));
        assert!(response.ends_with(r#"{"data":{"title":"Split across many reads"}}"#));
    }

    #[tokio::test]
    async fn test_form_body_is_parsed() {
        let body = b"title=Hello+there&draft=1";
        let mut raw = format!(
            "POST /echo HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/x-www-form-urlencoded\r\nContent-Length: {}\r\n\r\n",
            body.len()
        )
        .into_bytes();
        raw.extend_from_slice(body);

        let (result, response) = exchange(&raw, &ServerConfig::default()).await;
        assert!(result.is_ok());
        assert!(response.ends_with(r#"{"data":{"draft":"1","title":"Hello there"}}"#));
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let raw = b"POST /echo HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: 5\r\n\r\n{oops";
        let (result, response) = exchange(raw, &ServerConfig::default()).await;

        assert!(matches!(result, Err(Error::MalformedBody { .. })));
        assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    }

    #[tokio::test]
    async fn test_truncated_body_is_rejected() {
        let raw = b"POST /echo HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/x-www-form-urlencoded\r\nContent-Length: 100\r\n\r\namount=10";
        let (result, response) = exchange(raw, &ServerConfig::default()).await;

        assert!(matches!(result, Err(Error::IncompleteBody { expected: 100, received: 9 })));
        assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(!response.contains("amount"));
    }

    #[tokio::test]
    async fn test_redirect_with_line_break_is_server_error() {
        let routes = RouteTable::builder()
            .get("/next", |_req| async { Ok("redirect:/x\r\nSet-Cookie: admin=1") })
            .build();
        let pipeline = Pipeline::standard(routes, Arc::new(Templates::new()));
        let mut stream = MockTcpStream::new(b"GET /next HTTP/1.1\r\nHost: localhost\r\n\r\n".to_vec());

        let result = HttpServer::handle_connection(&mut stream, &pipeline, &ServerConfig::default()).await;

        assert!(matches!(result, Err(Error::InternalError(_))));
        let response = stream.written();
        assert!(response.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
        assert!(!response.contains("\r\nSet-Cookie"));
        assert!(!response.contains("Location:"));
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let config = ServerConfig { max_body_size: 16, ..ServerConfig::default() };
        let raw = b"POST /echo HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: 1000\r\n\r\n{}";
        let (result, response) = exchange(raw, &config).await;

        assert!(matches!(result, Err(Error::PayloadTooLarge(1000))));
        assert!(response.starts_with("HTTP/1.1 413 Payload Too Large\r\n"));
    }

    #[tokio::test]
    async fn test_missing_template_is_server_error() {
        let (result, response) = exchange(b"GET /page HTTP/1.1\r\nHost: localhost\r\n\r\n", &ServerConfig::default()).await;

        assert!(matches!(result, Err(Error::Render(_))));
        assert!(response.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
    }

    #[tokio::test]
    async fn test_request_timeout() {
        let config = ServerConfig { request_timeout: Duration::from_millis(20), ..ServerConfig::default() };
        let mut stream = SilentStream { write_data: Vec::new() };

        let result = HttpServer::handle_connection(&mut stream, &test_pipeline(), &config).await;

        assert!(matches!(result, Err(Error::Timeout(_))));
        let response = String::from_utf8_lossy(&stream.write_data).into_owned();
        assert!(response.starts_with("HTTP/1.1 503 Service Unavailable\r\n"));
    }

    #[tokio::test]
    async fn test_slow_handler_times_out() {
        let routes = RouteTable::builder()
            .get("/slow", |_req| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok("too late")
            })
            .build();
        let pipeline = Pipeline::standard(routes, Arc::new(Templates::new()));
        let config = ServerConfig { request_timeout: Duration::from_millis(20), ..ServerConfig::default() };
        let mut stream = MockTcpStream::new(b"GET /slow HTTP/1.1\r\nHost: localhost\r\n\r\n".to_vec());

        let result = HttpServer::handle_connection(&mut stream, &pipeline, &config).await;

        assert!(matches!(result, Err(Error::Timeout(_))));
        assert!(stream.written().starts_with("HTTP/1.1 503 Service Unavailable\r\n"));
    }

    #[test]
    fn test_server_creation() {
        let config = ServerConfig {
            addr: "127.0.0.1:8080".parse().unwrap(),
            max_connections: 42,
            ..ServerConfig::default()
        };

        let server = HttpServer::new(config.clone(), test_pipeline());
        assert_eq!(server.config.addr, config.addr);
        assert_eq!(server.config.max_connections, 42);
        assert_eq!(server.pipeline.routes().len(), 4);

        let defaults = ServerConfig::default();
        assert_eq!(defaults.addr.port(), 9000);
        assert_eq!(defaults.request_timeout, Duration::from_secs(30));
    }
}
