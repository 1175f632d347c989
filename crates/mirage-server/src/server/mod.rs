//! HTTP surface: server loop, router, handlers, response helpers.

pub mod handlers;
pub mod router;
pub mod types;

use crate::pipeline::MockPipeline;
use crate::traffic::TrafficLog;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};

/// Services shared across request tasks. Constructed once at process start.
pub struct AppState {
    pub pipeline: MockPipeline,
    pub traffic: Arc<TrafficLog>,
}

/// The Mirage HTTP server.
pub struct MirageServer {
    addr: SocketAddr,
    state: Arc<AppState>,
}

impl MirageServer {
    pub fn new(addr: SocketAddr, state: Arc<AppState>) -> Self {
        Self { addr, state }
    }

    /// Accept loop; each connection is served on its own task.
    pub async fn run(self) -> Result<(), anyhow::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        info!("Mirage listening on http://{}", self.addr);

        loop {
            let (stream, _) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let state = Arc::clone(&self.state);

            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let state = Arc::clone(&state);
                    async move { router::route_request(req, state).await }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    debug!("Connection error: {}", e);
                }
            });
        }
    }
}
