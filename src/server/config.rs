//! Server configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The address to bind to.
    pub addr: SocketAddr,
    /// The maximum number of concurrent connections.
    pub max_connections: usize,
    /// The read buffer size.
    pub read_buffer_size: usize,
    /// Largest request body accepted, in bytes.
    pub max_body_size: usize,
    /// Time allowed for reading one request and producing its response.
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 9000)),
            max_connections: 1024,
            read_buffer_size: 8192,
            max_body_size: 1024 * 1024,
            request_timeout: Duration::from_secs(30),
        }
    }
}
