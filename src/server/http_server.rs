//! HTTP server implementation.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::signal;
use log::{info, warn, error};

use crate::parser::{find_head_end, parse_request, HttpRequest};
use crate::pipeline::Pipeline;
use crate::server::config::ServerConfig;
use crate::server::error::Error;
use crate::server::response::{HttpResponse, StatusCode};

/// Largest request head accepted before the body starts.
const MAX_HEAD_SIZE: usize = 64 * 1024;

/// An HTTP server that feeds every request through a [`Pipeline`].
pub struct HttpServer {
    /// The server configuration.
    pub config: ServerConfig,
    /// The request pipeline, shared by all connections.
    pub pipeline: Arc<Pipeline>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and pipeline.
    pub fn new(config: ServerConfig, pipeline: Pipeline) -> Self {
        Self {
            config,
            pipeline: Arc::new(pipeline),
        }
    }

    /// Log the pipeline stages and registered endpoints.
    fn display_server_info(&self) {
        info!("Pipeline: {}", self.pipeline.stage_names().join(" -> "));
        info!("Registered endpoints:");
        for route in self.pipeline.routes().routes() {
            let methods = route.methods.iter()
                .map(|m| m.as_str())
                .collect::<Vec<&str>>()
                .join(", ");
            info!("  {methods} {}", route.path);
        }
    }

    /// Set up the TCP listener.
    async fn setup_listener(&self) -> Result<TcpListener, Error> {
        let listener = TcpListener::bind(&self.config.addr).await?;
        info!("Server listening on http://{addr}", addr = self.config.addr);
        Ok(listener)
    }

    /// Set up a Ctrl+C handler for graceful shutdown.
    fn setup_ctrl_c_handler(shutdown_tx: mpsc::Sender<()>, tasks: &mut JoinSet<()>) {
        tasks.spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received Ctrl+C, initiating graceful shutdown");
                    let _ = shutdown_tx.send(()).await;
                }
                Err(e) => {
                    error!("Error setting up Ctrl+C handler: {e}");
                }
            }
        });
    }

    /// Accept one connection, or turn it away when the server is full.
    fn handle_new_connection(
        mut socket: tokio::net::TcpStream,
        addr: SocketAddr,
        semaphore: Arc<tokio::sync::Semaphore>,
        pipeline: Arc<Pipeline>,
        config: Arc<ServerConfig>,
        tasks: &mut JoinSet<()>,
    ) {
        let permit = match semaphore.try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                warn!("Connection limit reached, rejecting connection from {addr}");
                tasks.spawn(async move {
                    let response = HttpResponse::new(StatusCode::SERVICE_UNAVAILABLE)
                        .with_content_type("text/plain;charset=utf-8")
                        .with_body_string("Server is at capacity, please try again later");
                    let _ = socket.write_all(&response.to_bytes()).await;
                });
                return;
            }
        };

        tasks.spawn(async move {
            // Held until the connection is done
            let _permit = permit;

            if let Err(e) = Self::handle_connection(&mut socket, &pipeline, &config).await {
                if e.status_code().as_u16() >= 500 {
                    error!("Error handling connection from {addr}: {e}");
                } else {
                    warn!("Rejected request from {addr}: {e}");
                }
            }
        });
    }

    /// Perform graceful shutdown.
    async fn perform_shutdown(tasks: &mut JoinSet<()>) {
        info!("Waiting for {len} active connections to complete...", len = tasks.len());
        let shutdown_timeout = tokio::time::Duration::from_secs(30);
        let _ = tokio::time::timeout(shutdown_timeout, async {
            while let Some(res) = tasks.join_next().await {
                if let Err(e) = res {
                    error!("Task failed during shutdown: {e}");
                }
            }
        }).await;

        info!("Server shutdown complete");
    }

    /// Start the server and listen for incoming connections until Ctrl+C.
    pub async fn start(&self) -> Result<(), Error> {
        self.display_server_info();

        let listener = self.setup_listener().await?;
        let semaphore = Arc::new(tokio::sync::Semaphore::new(self.config.max_connections));
        let config = Arc::new(self.config.clone());

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let mut tasks = JoinSet::new();
        Self::setup_ctrl_c_handler(shutdown_tx.clone(), &mut tasks);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Shutting down server...");
                    break;
                }

                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((socket, addr)) => {
                            Self::handle_new_connection(
                                socket,
                                addr,
                                semaphore.clone(),
                                self.pipeline.clone(),
                                config.clone(),
                                &mut tasks,
                            );
                        }
                        Err(e) => {
                            error!("Error accepting connection: {e}");
                            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
                        }
                    }
                }
            }

            // Reap finished connections so the set does not grow without bound
            while tasks.try_join_next().is_some() {}
        }

        Self::perform_shutdown(&mut tasks).await;

        Ok(())
    }

    /// Handle a single connection: read one request, run it, write the answer.
    ///
    /// Reading and processing share `config.request_timeout`. Errors are
    /// answered on the socket with the matching status and then returned.
    pub async fn handle_connection(
        socket: &mut (impl AsyncRead + AsyncWrite + Unpin),
        pipeline: &Pipeline,
        config: &ServerConfig,
    ) -> Result<(), Error> {
        let exchange = Self::exchange(&mut *socket, pipeline, config);
        let outcome = match tokio::time::timeout(config.request_timeout, exchange).await {
            Ok(outcome) => outcome,
            Err(_) => Err(Error::Timeout(config.request_timeout)),
        };

        match outcome {
            Ok(Some(response)) => {
                socket.write_all(&response.to_bytes()).await?;
                Ok(())
            }
            // Connection closed before sending anything
            Ok(None) => Ok(()),
            Err(e) => {
                socket.write_all(&error_response(&e).to_bytes()).await?;
                Err(e)
            }
        }
    }

    /// Read one request and run it through the pipeline.
    async fn exchange(
        socket: &mut (impl AsyncRead + Unpin),
        pipeline: &Pipeline,
        config: &ServerConfig,
    ) -> Result<Option<HttpResponse>, Error> {
        match Self::read_request(socket, config).await? {
            Some(request) => pipeline.handle(request).await.map(Some),
            None => Ok(None),
        }
    }

    /// Read the request head, then exactly the body `Content-Length` declares.
    async fn read_request(
        socket: &mut (impl AsyncRead + Unpin),
        config: &ServerConfig,
    ) -> Result<Option<HttpRequest>, Error> {
        let mut buf = Vec::with_capacity(config.read_buffer_size);
        let mut chunk = vec![0; config.read_buffer_size];

        let body_start = loop {
            if let Some((_, body_start)) = find_head_end(&buf) {
                break Some(body_start);
            }
            if buf.len() > MAX_HEAD_SIZE {
                return Err(Error::PayloadTooLarge(buf.len()));
            }
            let n = socket.read(&mut chunk).await?;
            if n == 0 {
                break None;
            }
            buf.extend_from_slice(&chunk[..n]);
        };

        let Some(body_start) = body_start else {
            // Peer stopped sending before the blank line
            if buf.is_empty() {
                return Ok(None);
            }
            return Ok(Some(parse_request(&buf)?));
        };

        let mut request = parse_request(&buf)?;
        let declared = request.content_length()?.unwrap_or(0);
        if declared > config.max_body_size {
            return Err(Error::PayloadTooLarge(declared));
        }

        while buf.len() - body_start < declared {
            let n = socket.read(&mut chunk).await?;
            if n == 0 {
                return Err(Error::IncompleteBody {
                    expected: declared,
                    received: buf.len() - body_start,
                });
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        request.body = buf[body_start..body_start + declared].to_vec();
        Ok(Some(request))
    }
}

/// The response sent when an error reaches the server.
pub fn error_response(error: &Error) -> HttpResponse {
    let message = match error {
        Error::ParseError(e) => format!("Error parsing request: {e}"),
        other => other.to_string(),
    };

    let response = HttpResponse::new(error.status_code())
        .with_content_type("text/plain;charset=utf-8")
        .with_body_string(message);

    match error {
        Error::MethodNotAllowed { allowed, .. } => {
            let allow = allowed.iter().map(|m| m.as_str()).collect::<Vec<&str>>().join(", ");
            response.with_header("Allow", allow)
        }
        _ => response,
    }
}
