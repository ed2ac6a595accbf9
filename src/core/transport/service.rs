//! Picks the configured transport and runs it until shutdown.

use std::future::Future;

use tracing::info;

use super::{TransportConfig, TransportResult};
use crate::core::{McpServer, Result};

#[cfg(feature = "stdio")]
use super::stdio::StdioTransport;

#[cfg(feature = "tcp")]
use super::tcp::TcpTransport;

#[cfg(feature = "http")]
use super::http::HttpTransport;

pub struct TransportService {
    config: TransportConfig,
}

impl TransportService {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    /// Serve until the transport ends on its own.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        info!(
            "Starting transport: {} ({})",
            self.config.description(),
            catalog_summary(&server)
        );

        match self.config {
            #[cfg(feature = "stdio")]
            TransportConfig::Stdio => StdioTransport::run(server).await,
            #[cfg(feature = "tcp")]
            TransportConfig::Tcp(listen) => TcpTransport::new(listen).run(server).await,
            #[cfg(feature = "http")]
            TransportConfig::Http(cfg) => HttpTransport::new(cfg).run(server).await,
        }
    }

    /// Run until the transport ends or `shutdown` resolves. Shutdown wins a tie.
    pub async fn run_until<F>(self, server: McpServer, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            _ = shutdown => {
                info!("Shutdown requested");
                Ok(())
            }
            result = self.run(server) => Ok(result?),
        }
    }
}

/// One-line view of what a new session will see.
pub(crate) fn catalog_summary(server: &McpServer) -> String {
    let stats = server.stats();
    let routable = stats
        .by_namespace
        .keys()
        .filter(|ns| server.gateway().has_handler(ns))
        .count();
    format!(
        "{} tools in {} namespaces, {} routable",
        stats.total_tools,
        stats.by_namespace.len(),
        routable
    )
}
