//! MCP Tool Discovery Library
//!
//! Discovers tools, prompts and resources declared by independently
//! authored MCP server modules, keeps the aggregated catalog live as files
//! change, and routes qualified tool calls to per-namespace handlers.
//!
//! # Architecture
//!
//! - **core**: Configuration, error handling, the MCP server and transports
//! - **domains**: Business logic organized by bounded contexts
//!   - **discovery**: Scanning, declaration parsing, namespacing, the registry
//!   - **gateway**: Namespace handlers and tool execution
//!
//! # Example
//!
//! ```rust,no_run
//! use mcp_tool_discovery::core::DiscoveryConfig;
//! use mcp_tool_discovery::domains::gateway::McpGateway;
//! use serde_json::{Value, json};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let gateway = McpGateway::from_config(DiscoveryConfig {
//!         source_dirs: vec!["servers".into()],
//!         ..DiscoveryConfig::default()
//!     })?;
//!
//!     gateway.register_namespace_handler("solana", |tool: String, args: Value| async move {
//!         Ok::<_, anyhow::Error>(json!({ "tool": tool, "args": args }))
//!     });
//!
//!     let stats = gateway.initialize().await;
//!     println!("{} tools discovered", stats.total_tools);
//!
//!     let result = gateway
//!         .execute_tool("solana:get_balance", json!({ "address": "..." }))
//!         .await?;
//!     println!("{result}");
//!
//!     gateway.stop();
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
pub use domains::discovery::ToolRegistry;
pub use domains::gateway::{McpGateway, NamespaceHandler};
