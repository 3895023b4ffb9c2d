//! Tests for the HTTP parser.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use serde::Deserialize;
    use serde_json::json;

    use crate::parser::{find_head_end, parse_request, Error, HttpRequest, HttpVersion, Method, ParsedData};

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_simple_get_request() {
        let request = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.method, Method::GET);
        assert_eq!(result.path, "/index.html");
        assert_eq!(result.version, HttpVersion::Http11);
        assert_eq!(result.headers.get("Host").unwrap(), "example.com");
        assert!(result.body.is_empty());
        assert!(result.parsed_data.is_none());
    }

    #[test]
    fn test_missing_host_header() {
        let request = b"GET /index.html HTTP/1.1\r\n\r\n";
        let result = parse_request(request);
        assert!(matches!(result, Err(Error::MissingHeader(ref h)) if h == "Host"));
    }

    #[test]
    fn test_http10_without_host() {
        let request = b"GET /index.html HTTP/1.0\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.version, HttpVersion::Http10);
        assert!(result.headers.is_empty());
    }

    #[test]
    fn test_invalid_method() {
        let request = b"BREW /pot HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let result = parse_request(request);
        assert!(matches!(result, Err(Error::InvalidMethod(ref m)) if m == "BREW"));
    }

    #[test]
    fn test_invalid_http_version() {
        let request = b"GET /index.html HTTP/9.9\r\nHost: example.com\r\n\r\n";
        let result = parse_request(request);
        assert!(matches!(result, Err(Error::InvalidVersion(ref v)) if v == "HTTP/9.9"));
    }

    #[test]
    fn test_http2_is_rejected() {
        for version in ["HTTP/2", "HTTP/2.0"] {
            let raw = format!("GET / {version}\r\nHost: example.com\r\n\r\n");
            let result = parse_request(raw.as_bytes());
            assert!(matches!(result, Err(Error::InvalidVersion(ref v)) if v == version));
        }
    }

    #[test]
    fn test_invalid_header_format() {
        let request = b"GET /index.html HTTP/1.1\r\nInvalidHeader\r\n\r\n";
        let result = parse_request(request);
        assert!(matches!(result, Err(Error::InvalidHeaderFormat)));
    }

    #[test]
    fn test_empty_request() {
        assert!(matches!(parse_request(b""), Err(Error::EmptyRequest)));
    }

    #[test]
    fn test_incomplete_request_line() {
        let result = parse_request(b"GET\r\n");
        assert!(matches!(result, Err(Error::MalformedRequestLine(_))));
    }

    #[test]
    fn test_method_round_trip() {
        for method in Method::ALL {
            assert_eq!(method.as_str().parse::<Method>().unwrap(), method);
            assert_eq!(method.to_string(), method.as_str());
        }
    }

    #[test]
    fn test_mixed_line_endings() {
        let request = b"GET /index.html HTTP/1.1\r\nHost: example.com\nUser-Agent: test\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.headers.get("Host").unwrap(), "example.com");
        assert_eq!(result.headers.get("User-Agent").unwrap(), "test");
    }

    #[test]
    fn test_path_with_query_parameters() {
        let request = b"GET /search?q=test&flag HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.path, "/search?q=test&flag");
        assert_eq!(result.route_path(), "/search");
        assert_eq!(result.get_query_param("q").unwrap(), "test");
        assert_eq!(result.get_query_param("flag").unwrap(), "");
    }

    #[test]
    fn test_malformed_utf8_in_head() {
        let request = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\nX-Test: \xFF\xFF\r\n\r\n";
        let result = parse_request(request);
        assert!(matches!(result, Err(Error::MalformedRequestLine(ref s)) if s == "Invalid UTF-8"));
    }

    #[test]
    fn test_binary_body_is_kept() {
        let mut request = b"POST /upload HTTP/1.1\r\nHost: example.com\r\nContent-Length: 3\r\n\r\n".to_vec();
        request.extend_from_slice(&[0xFF, 0x00, 0xFE]);
        let result = parse_request(&request).unwrap();
        assert_eq!(result.body, vec![0xFF, 0x00, 0xFE]);
    }

    #[test]
    fn test_body_with_content_length() {
        let request = b"POST /api/users?role=admin HTTP/1.1\r\n\
            Host: example.com\r\n\
            Content-Type: application/json\r\n\
            Content-Length: 46\r\n\
            \r\n\
            {\"name\":\"John Doe\",\"email\":\"john@example.com\"}";

        let result = parse_request(request).unwrap();
        assert_eq!(result.method, Method::POST);
        assert_eq!(result.route_path(), "/api/users");
        assert_eq!(result.content_length().unwrap(), Some(46));
        assert_eq!(result.body, br#"{"name":"John Doe","email":"john@example.com"}"#.to_vec());
    }

    #[test]
    fn test_body_truncated_to_content_length() {
        let request = b"POST /x HTTP/1.1\r\nHost: a\r\nContent-Length: 2\r\n\r\nabcdef";
        let result = parse_request(request).unwrap();
        assert_eq!(result.body, b"ab".to_vec());
    }

    #[test]
    fn test_invalid_content_length() {
        let request = b"POST /x HTTP/1.1\r\nHost: a\r\nContent-Length: lots\r\n\r\n";
        let result = parse_request(request);
        assert!(matches!(result, Err(Error::InvalidContentLength(ref v)) if v == "lots"));
    }

    #[test]
    fn test_find_head_end() {
        assert_eq!(find_head_end(b"GET / HTTP/1.0\r\n\r\nbody"), Some((14, 18)));
        assert_eq!(find_head_end(b"GET / HTTP/1.0\n\nbody"), Some((14, 16)));
        assert_eq!(find_head_end(b"GET / HTTP/1.0\r\nHost: a\r\n"), None);
    }

    #[test]
    fn test_content_type_prefix_is_case_insensitive() {
        let request = HttpRequest::new(
            Method::POST,
            "/".to_string(),
            HttpVersion::Http11,
            headers(&[("content-type", "Application/JSON; charset=utf-8")]),
        );
        assert!(request.is_json());
        assert!(request.content_type_starts_with("application/json"));
        assert!(!request.content_type_starts_with("application/x-www-form-urlencoded"));
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct TestUser {
        name: String,
        email: String,
    }

    #[test]
    fn test_json_body() {
        let body = br#"{"name":"John Doe","email":"john@example.com"}"#.to_vec();
        let request = HttpRequest::with_body(
            Method::POST,
            "/api/users".to_string(),
            HttpVersion::Http11,
            headers(&[("Content-Type", "application/json")]),
            body.clone(),
        );
        let user: TestUser = request.json().unwrap();
        assert_eq!(user.name, "John Doe");

        let plain = HttpRequest::with_body(
            Method::POST,
            "/api/users".to_string(),
            HttpVersion::Http11,
            headers(&[("Content-Type", "text/plain")]),
            body,
        );
        let result: Result<TestUser, _> = plain.json();
        assert!(matches!(result, Err(Error::MissingHeader(_))));
    }

    #[test]
    fn test_parsed_data_lookup() {
        let json_data = ParsedData::Json(json!({"x": 1, "name": "Ann"}));
        assert_eq!(json_data.get("x"), Some(json!(1)));
        assert_eq!(json_data.get("missing"), None);

        let form = ParsedData::Form(vec![
            ("tag".to_string(), "a".to_string()),
            ("tag".to_string(), "b".to_string()),
        ]);
        assert_eq!(form.get("tag"), Some(json!("a")));
        assert_eq!(form.to_value(), json!({"tag": "b"}));
    }
}
