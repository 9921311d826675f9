//! Blocking HTTP server: a fixed pool of worker threads sharing one
//! `tiny_http` listener.

use std::io::Read as _;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use log::{debug, error, info};

use crate::routes::App;

/// Request bodies larger than this are truncated before parsing.
const MAX_BODY_BYTES: u64 = 64 * 1024;

/// Failure to start the HTTP server.
#[derive(thiserror::Error, Debug)]
pub enum ServerError {
    #[error("Could not parse address: {0}")]
    AddrParseFailed(#[from] std::net::AddrParseError),

    #[error("Failed to create server at address {0}: {1}")]
    CreateServerFailed(String, Box<dyn std::error::Error + Send + Sync + 'static>),

    #[error("Failed to spawn worker thread: {0}")]
    SpawnFailed(#[source] std::io::Error),
}

/// HTTP host for the segviz [`App`].
#[must_use = "Dropping this means stopping the server"]
pub struct Server {
    inner: Arc<ServerInner>,
    workers: Vec<JoinHandle<()>>,
}

struct ServerInner {
    server: tiny_http::Server,
    app: App,
    shutdown: AtomicBool,
}

impl Server {
    /// Start serving `app` on `bind_ip:port` with `num_workers` threads.
    ///
    /// Port `0` lets the OS pick a free port; see [`Self::server_url`].
    /// The server stops when the returned value is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] if the address is invalid, the socket
    /// cannot be bound, or a worker thread cannot be spawned.
    pub fn new(
        bind_ip: &str,
        port: u16,
        num_workers: usize,
        app: App,
    ) -> Result<Self, ServerError> {
        let bind_addr = SocketAddr::new(bind_ip.parse()?, port);

        let server = tiny_http::Server::http(bind_addr)
            .map_err(|err| ServerError::CreateServerFailed(bind_addr.to_string(), err))?;

        let inner = Arc::new(ServerInner {
            server,
            app,
            shutdown: AtomicBool::new(false),
        });

        let mut this = Self {
            inner,
            workers: Vec::with_capacity(num_workers),
        };
        for i in 0..num_workers.max(1) {
            let inner = Arc::clone(&this.inner);
            let handle = std::thread::Builder::new()
                .name(format!("segviz-http-{i}"))
                .spawn(move || inner.serve())
                .map_err(ServerError::SpawnFailed)?;
            this.workers.push(handle);
        }

        info!(
            "listening on {} with {} worker(s)",
            this.server_url(),
            this.workers.len()
        );
        Ok(this)
    }

    /// Includes `http://` prefix
    pub fn server_url(&self) -> String {
        let local_addr = self.inner.server.server_addr();
        if let Some(local_addr) = local_addr.clone().to_ip()
            && local_addr.ip().is_unspecified()
        {
            return format!("http://127.0.0.1:{}", local_addr.port());
        }
        format!("http://{local_addr}")
    }

    /// Blocks execution as long as the server is running.
    pub fn block(mut self) {
        for handle in self.workers.drain(..) {
            handle.join().ok();
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        debug!("shutting down http server");
        self.inner.shutdown.store(true, Ordering::Release);
        // Each call wakes at most one thread blocked in `recv`.
        for _ in 0..self.workers.len() {
            self.inner.server.unblock();
        }
        for handle in self.workers.drain(..) {
            handle.join().ok();
        }
    }
}

impl ServerInner {
    fn serve(&self) {
        loop {
            let request = self.server.recv();
            if self.shutdown.load(Ordering::Acquire) {
                return;
            }

            let request = match request {
                Ok(request) => request,
                Err(err) => {
                    error!("Failed to receive http request: {err}");
                    continue;
                }
            };

            if let Err(err) = self.send_response(request) {
                error!("Failed to send http response: {err}");
            }
        }
    }

    fn send_response(&self, mut request: tiny_http::Request) -> Result<(), std::io::Error> {
        let mut body = Vec::new();
        request
            .as_reader()
            .take(MAX_BODY_BYTES)
            .read_to_end(&mut body)?;

        let reply = self.app.handle(request.method(), request.url(), &body);
        info!("{} {} -> {}", request.method(), request.url(), reply.status);

        let mut response =
            tiny_http::Response::from_string(reply.body).with_status_code(reply.status);
        if let Ok(header) =
            tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
        {
            response.add_header(header);
        }

        request.respond(response)
    }
}
