//! One rmcp session per TCP connection.
//!
//! Sessions share the server, so a hot reload or a newly registered
//! namespace handler is visible to every connected client at once.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rmcp::ServiceExt;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use super::{ListenAddr, TransportError, TransportResult};
use super::service::catalog_summary;
use crate::core::McpServer;

/// Back-off after a failed `accept`.
const ACCEPT_RETRY: Duration = Duration::from_millis(100);

pub struct TcpTransport {
    listen: ListenAddr,
    sessions: Arc<AtomicUsize>,
}

impl TcpTransport {
    pub fn new(listen: ListenAddr) -> Self {
        Self {
            listen,
            sessions: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Accept connections until the task is cancelled.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.listen.address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;
        info!("Listening on {} (line-delimited JSON-RPC)", addr);

        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                    tokio::time::sleep(ACCEPT_RETRY).await;
                    continue;
                }
            };
            if let Err(e) = stream.set_nodelay(true) {
                debug!("TCP_NODELAY not set for {}: {}", peer, e);
            }

            let server = server.clone();
            let sessions = self.sessions.clone();
            tokio::spawn(async move {
                let open = sessions.fetch_add(1, Ordering::Relaxed) + 1;
                info!("Client {} connected ({} open)", peer, open);
                serve_session(server, stream, peer).await;
                let open = sessions.fetch_sub(1, Ordering::Relaxed) - 1;
                info!("Client {} gone ({} open)", peer, open);
            });
        }
    }
}

async fn serve_session(server: McpServer, stream: TcpStream, peer: SocketAddr) {
    let summary = catalog_summary(&server);
    let session = match server.serve(stream).await {
        Ok(session) => session,
        Err(e) => {
            warn!("Handshake with {} failed: {}", peer, e);
            return;
        }
    };
    debug!("Session with {} ready: {}", peer, summary);

    if let Err(e) = session.waiting().await {
        warn!("Session with {} ended abnormally: {}", peer, e);
    }
}
