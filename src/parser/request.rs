//! HTTP request parsing and representation.

use std::collections::HashMap;
use std::str::FromStr;
use serde::de::DeserializeOwned;

use crate::parser::data::ParsedData;
use crate::parser::error::Error;
use crate::parser::method::Method;
use crate::parser::version::HttpVersion;

/// Represents an HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The request path, including any query string
    pub path: String,
    /// The HTTP version
    pub version: HttpVersion,
    /// The HTTP headers
    pub headers: HashMap<String, String>,
    /// The raw request body
    pub body: Vec<u8>,
    /// Query parameters parsed from the path
    pub query_params: HashMap<String, String>,
    /// The decoded body, filled in by the body-parser middleware
    pub parsed_data: Option<ParsedData>,
}

impl HttpRequest {
    /// Create a new HTTP request with an empty body.
    pub fn new(method: Method, path: String, version: HttpVersion, headers: HashMap<String, String>) -> Self {
        let query_params: HashMap<String, String> = path
            .split_once('?')
            .map(|(_, query)| query
                .split('&')
                .filter(|s| !s.is_empty())
                .map(|pair| {
                    if let Some((k, v)) = pair.split_once('=') {
                        (k.to_string(), v.to_string())
                    } else {
                        (pair.to_string(), String::new())
                    }
                })
                .collect())
            .unwrap_or_default();

        Self {
            method,
            path,
            version,
            headers,
            body: Vec::new(),
            query_params,
            parsed_data: None,
        }
    }

    /// Create a new HTTP request with a body.
    pub fn with_body(method: Method, path: String, version: HttpVersion, headers: HashMap<String, String>, body: Vec<u8>) -> Self {
        let mut request = Self::new(method, path, version, headers);
        request.body = body;
        request
    }

    /// Get a header value. Header names are compared case-insensitively.
    pub fn get_header(&self, name: &str) -> Option<&String> {
        self.headers.iter().find_map(|(k, v)| {
            if k.eq_ignore_ascii_case(name) {
                Some(v)
            } else {
                None
            }
        })
    }

    /// Check if a header exists.
    pub fn has_header(&self, name: &str) -> bool {
        self.get_header(name).is_some()
    }

    /// The declared `Content-Type`, or an empty string when absent.
    pub fn content_type(&self) -> &str {
        self.get_header("Content-Type").map(String::as_str).unwrap_or("")
    }

    /// Whether the media type of `Content-Type` starts with `prefix`,
    /// ignoring ASCII case.
    pub fn content_type_starts_with(&self, prefix: &str) -> bool {
        let content_type = self.content_type().trim_start();
        content_type.len() >= prefix.len()
            && content_type.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
    }

    /// The declared `Content-Length`, if any.
    pub fn content_length(&self) -> Result<Option<usize>, Error> {
        match self.get_header("Content-Length") {
            Some(value) => value
                .trim()
                .parse::<usize>()
                .map(Some)
                .map_err(|_| Error::InvalidContentLength(value.clone())),
            None => Ok(None),
        }
    }

    /// The path with any query string removed. Routes are matched on this.
    pub fn route_path(&self) -> &str {
        match self.path.split_once('?') {
            Some((path, _)) => path,
            None => &self.path,
        }
    }

    /// Deserialize the raw body as JSON.
    ///
    /// Fails with [`Error::MissingHeader`] when the request is not declared as
    /// JSON and with [`Error::Json`] when the body does not decode.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        if !self.is_json() {
            return Err(Error::MissingHeader("Content-Type: application/json".to_string()));
        }

        let json = serde_json::from_slice(&self.body)?;
        Ok(json)
    }

    /// Check if the request declares a JSON body.
    pub fn is_json(&self) -> bool {
        self.content_type_starts_with("application/json")
    }

    /// Get a query parameter value.
    pub fn get_query_param(&self, name: &str) -> Option<&String> {
        self.query_params.get(name)
    }

    /// Check if a query parameter exists.
    pub fn has_query_param(&self, name: &str) -> bool {
        self.query_params.contains_key(name)
    }
}

/// Locate the blank line that ends the request head.
///
/// Returns the length of the head and the offset where the body starts.
/// Both `\r\n\r\n` and a bare `\n\n` are accepted, whichever comes first.
pub fn find_head_end(input: &[u8]) -> Option<(usize, usize)> {
    let crlf = input
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|i| (i, i + 4));
    let lf = input
        .windows(2)
        .position(|w| w == b"\n\n")
        .map(|i| (i, i + 2));

    match (crlf, lf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

/// Parse an HTTP request from a byte slice.
///
/// Everything after the head is taken as the body, truncated to
/// `Content-Length` when the header is present. A body shorter than the
/// declared length is kept as-is; reading the rest is the caller's job.
pub fn parse_request(input: &[u8]) -> Result<HttpRequest, Error> {
    let (head, body) = match find_head_end(input) {
        Some((head_len, body_start)) => (&input[..head_len], &input[body_start..]),
        None => (input, &input[input.len()..]),
    };

    let head_str = match std::str::from_utf8(head) {
        Ok(s) => s,
        Err(_) => return Err(Error::MalformedRequestLine("Invalid UTF-8".to_string())),
    };

    let mut lines = head_str.lines();

    let request_line = match lines.next() {
        Some(line) => line,
        None => return Err(Error::EmptyRequest),
    };

    // Method, path and version
    let parts: Vec<&str> = request_line.split_whitespace().collect();
    if parts.len() != 3 {
        return Err(Error::MalformedRequestLine(request_line.to_string()));
    }

    let method = Method::from_str(parts[0])?;

    let path = parts[1].to_string();
    if path.is_empty() {
        return Err(Error::InvalidPath);
    }

    let version = HttpVersion::from_str(parts[2])?;

    let mut headers = HashMap::new();
    for line in lines {
        if line.is_empty() {
            break;
        }

        let (name, value) = line.split_once(':').ok_or(Error::InvalidHeaderFormat)?;
        headers.insert(name.trim().to_string(), value.trim().to_string());
    }

    if version.requires_host() && !headers.keys().any(|k| k.eq_ignore_ascii_case("Host")) {
        return Err(Error::MissingHeader("Host".to_string()));
    }

    let mut request = HttpRequest::new(method, path, version, headers);
    let body_len = match request.content_length()? {
        Some(declared) => declared.min(body.len()),
        None => body.len(),
    };
    request.body = body[..body_len].to_vec();

    Ok(request)
}
