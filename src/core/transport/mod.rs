//! Serving the gateway to MCP clients.
//!
//! Each transport is behind its own feature (`stdio` by default, `tcp`,
//! `http`). All of them answer from the same [`McpServer`](crate::core::McpServer),
//! so every session sees the live catalog and the shared handler table.

mod config;
mod error;
mod service;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "tcp")]
pub mod tcp;

#[cfg(feature = "stdio")]
pub mod stdio;

pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use service::TransportService;

#[cfg(any(feature = "tcp", feature = "http"))]
pub use config::ListenAddr;

#[cfg(feature = "tcp")]
pub(crate) use config::DEFAULT_TCP_PORT;

#[cfg(feature = "http")]
pub use config::HttpConfig;

#[cfg(feature = "http")]
pub(crate) use config::DEFAULT_HTTP_PORT;
