//! MCP Gateway Entry Point
//!
//! Initializes logging, loads configuration, discovers modules, wires up
//! namespace handlers and serves the aggregated catalog over the
//! configured transport.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use mcp_tool_discovery::core::{Config, McpServer, TransportService};
use mcp_tool_discovery::domains::discovery::RegistryEvent;
use mcp_tool_discovery::domains::gateway::McpGateway;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment
    let config = Config::from_env();

    init_logging(&config.logging.level, config.logging.with_timestamps);

    info!("Starting {} v{}", config.server.name, config.server.version);

    let gateway = McpGateway::from_settings(config.discovery.clone(), &config.handlers)
        .context("Failed to set up the gateway")?;

    gateway.get_registry().subscribe(|event| match event {
        RegistryEvent::ModuleError { path, error } => warn!("Module {:?} failed: {}", path, error),
        RegistryEvent::Updated(stats) => info!(
            "Catalog updated: {} tools, {} prompts, {} resources",
            stats.total_tools, stats.total_prompts, stats.total_resources
        ),
        _ => {}
    });

    let stats = gateway.initialize().await;
    info!(
        "Discovered {} tools in {} namespaces ({} of {} modules loaded)",
        stats.total_tools,
        stats.by_namespace.len(),
        stats.loaded_modules,
        stats.total_modules
    );

    for namespace in stats.by_namespace.keys() {
        if !gateway.has_handler(namespace) {
            warn!(
                "Namespace '{}' has no handler; its tools will be listed but not callable",
                namespace
            );
        }
    }

    let gateway = Arc::new(gateway);
    let server = McpServer::new(config.clone(), gateway.clone());

    // Create and run the transport service
    let transport = TransportService::new(config.transport);
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    };
    let result = transport.run_until(server, shutdown).await;

    gateway.stop();
    info!("Server shutting down");

    result.context("Transport failed")
}

/// Initialize the logging subsystem.
///
/// Logs go to stderr so the STDIO transport keeps stdout to itself.
fn init_logging(level: &str, with_timestamps: bool) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);

    if with_timestamps {
        builder.init();
    } else {
        builder.without_time().init();
    }
}
