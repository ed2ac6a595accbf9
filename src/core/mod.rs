//! Core module containing shared infrastructure components.
//!
//! Configuration, the unified error type, the rmcp server handler and the
//! transport layer. Discovery and routing live under `domains`.

pub mod config;
pub mod error;
pub mod server;
pub mod transport;

pub use config::{Config, DiscoveryConfig, HandlersConfig};
pub use error::{Error, Result};
pub use server::McpServer;
pub use transport::{TransportConfig, TransportService};
