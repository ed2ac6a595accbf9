//! Errors raised while wiring up and serving the gateway.
//!
//! Routing failures stay [`GatewayError`](crate::domains::gateway::GatewayError)
//! because they are answered per request, never fatal to the process.

use thiserror::Error;

use super::transport::TransportError;
use crate::domains::discovery::DiscoveryError;

/// A specialized Result type for gateway setup and serving.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The discovery configuration was rejected (bad include/exclude pattern).
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    /// A configured namespace endpoint could not get an HTTP client.
    #[error("Handler for namespace '{namespace}' could not be built: {source}")]
    ForwardHandler {
        namespace: String,
        #[source]
        source: reqwest::Error,
    },

    /// The transport failed to bind or to serve.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl Error {
    pub fn forward_handler(namespace: impl Into<String>, source: reqwest::Error) -> Self {
        Self::ForwardHandler {
            namespace: namespace.into(),
            source,
        }
    }
}
