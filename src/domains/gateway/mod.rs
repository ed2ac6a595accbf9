//! Gateway domain module.
//!
//! Routes qualified tool calls (`<namespace>:<tool>`) from MCP clients to
//! the handler registered for the tool's namespace.
//!
//! ## Architecture
//!
//! - `gateway.rs` - Handler table and tool execution
//! - `handlers.rs` - The `NamespaceHandler` trait (closures implement it)
//! - `forward.rs` - Handler forwarding calls to a remote MCP endpoint
//! - `error.rs` - Gateway-specific error types

mod error;
mod forward;
#[allow(clippy::module_inception)]
mod gateway;
mod handlers;

pub use error::GatewayError;
pub use forward::HttpForwardHandler;
pub use gateway::McpGateway;
pub use handlers::NamespaceHandler;
