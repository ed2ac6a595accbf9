//! Configuration management for the MCP server.
//!
//! This module provides a centralized configuration structure that can be
//! populated from environment variables or defaults. Only the binary reads
//! the environment; library types take explicit config values.

use super::transport::TransportConfig;
#[cfg(any(feature = "tcp", feature = "http"))]
use super::transport::ListenAddr;
#[cfg(feature = "http")]
use super::transport::{DEFAULT_HTTP_PORT, HttpConfig};
#[cfg(feature = "tcp")]
use super::transport::DEFAULT_TCP_PORT;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Default include rule: conventionally named MCP server modules.
pub const DEFAULT_INCLUDE_PATTERN: &str = r"^mcp[-_].+\.(ts|js|mjs|cjs)$";

/// Default exclude rules: test/spec files and type declarations.
pub const DEFAULT_EXCLUDE_PATTERNS: [&str; 2] = [r"\.(test|spec)\.[^.]+$", r"\.d\.ts$"];

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Module discovery configuration.
    pub discovery: DiscoveryConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Namespace handler configuration.
    pub handlers: HandlersConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "mcp-tool-discovery".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Where to look for MCP server modules and how to pick them out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Directories scanned recursively, in order.
    pub source_dirs: Vec<PathBuf>,

    /// Regexes matched against a file's name. Empty matches everything.
    pub include_patterns: Vec<String>,

    /// Regexes matched against a file's name. Any match excludes the file.
    pub exclude_patterns: Vec<String>,

    /// Re-discover on file system changes after `initialize`.
    pub watch_enabled: bool,

    /// Quiet period before a burst of changes triggers a rescan.
    pub debounce_ms: u64,

    /// Maximum number of module files read concurrently during a pass.
    pub read_concurrency: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            source_dirs: Vec::new(),
            include_patterns: vec![DEFAULT_INCLUDE_PATTERN.to_string()],
            exclude_patterns: DEFAULT_EXCLUDE_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            watch_enabled: false,
            debounce_ms: 300,
            read_concurrency: 16,
        }
    }
}

impl DiscoveryConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,

    /// Whether to include timestamps in log output.
    pub with_timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_timestamps: true,
        }
    }
}

/// Remote endpoints serving namespaces, wired up by the binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlersConfig {
    /// Namespace -> JSON-RPC endpoint URL.
    pub endpoints: BTreeMap<String, String>,

    /// Per-request timeout for forwarded calls.
    pub timeout_secs: u64,
}

impl Default for HandlersConfig {
    fn default() -> Self {
        Self {
            endpoints: BTreeMap::new(),
            timeout_secs: 30,
        }
    }
}

impl HandlersConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables are expected to be prefixed with `MCP_`.
    /// For example: `MCP_SERVER_NAME`, `MCP_SOURCE_DIRS`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        // Discovery
        if let Ok(dirs) = std::env::var("MCP_SOURCE_DIRS") {
            config.discovery.source_dirs = split_list(&dirs).map(PathBuf::from).collect();
            info!("Source directories: {:?}", config.discovery.source_dirs);
        } else {
            warn!("MCP_SOURCE_DIRS not set - the tool catalog will be empty");
        }

        if let Ok(patterns) = std::env::var("MCP_INCLUDE_PATTERNS") {
            config.discovery.include_patterns = split_list(&patterns).map(String::from).collect();
        }

        if let Ok(patterns) = std::env::var("MCP_EXCLUDE_PATTERNS") {
            config.discovery.exclude_patterns = split_list(&patterns).map(String::from).collect();
        }

        if let Ok(watch) = std::env::var("MCP_WATCH") {
            config.discovery.watch_enabled = watch.parse().unwrap_or(false);
            info!("Hot reload enabled: {}", config.discovery.watch_enabled);
        }

        if let Some(ms) = parse_var("MCP_WATCH_DEBOUNCE_MS") {
            config.discovery.debounce_ms = ms;
        }

        if let Some(n) = parse_var("MCP_READ_CONCURRENCY") {
            config.discovery.read_concurrency = n;
        }

        // Handlers
        if let Ok(endpoints) = std::env::var("MCP_NAMESPACE_ENDPOINTS") {
            config.handlers.endpoints = parse_endpoints(&endpoints);
            info!(
                "Namespace endpoints configured for: {:?}",
                config.handlers.endpoints.keys().collect::<Vec<_>>()
            );
        }

        if let Some(secs) = parse_var("MCP_HANDLER_TIMEOUT_SECS") {
            config.handlers.timeout_secs = secs;
        }

        config.transport = transport_from_env();

        config
    }
}

/// `MCP_TRANSPORT` picks the transport; unknown or disabled values fall
/// back to the build's default.
fn transport_from_env() -> TransportConfig {
    let kind = std::env::var("MCP_TRANSPORT")
        .unwrap_or_default()
        .to_lowercase();

    match kind.as_str() {
        #[cfg(feature = "tcp")]
        "tcp" => TransportConfig::Tcp(listen_from_env("MCP_TCP", DEFAULT_TCP_PORT)),
        #[cfg(feature = "http")]
        "http" => {
            let mut http = HttpConfig {
                listen: listen_from_env("MCP_HTTP", DEFAULT_HTTP_PORT),
                ..HttpConfig::default()
            };
            if let Ok(path) = std::env::var("MCP_HTTP_PATH") {
                http.rpc_path = path;
            }
            if let Ok(cors) = std::env::var("MCP_HTTP_CORS") {
                http.enable_cors = !matches!(cors.to_lowercase().as_str(), "false" | "0");
            }
            TransportConfig::Http(http)
        }
        "" => TransportConfig::default(),
        other => {
            warn!("Transport {:?} is not available in this build, using default", other);
            TransportConfig::default()
        }
    }
}

#[cfg(any(feature = "tcp", feature = "http"))]
fn listen_from_env(prefix: &str, default_port: u16) -> ListenAddr {
    let mut listen = ListenAddr::local(default_port);
    if let Some(port) = parse_var(&format!("{prefix}_PORT")) {
        listen.port = port;
    }
    if let Ok(host) = std::env::var(format!("{prefix}_HOST")) {
        listen.host = host;
    }
    listen
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    let value = std::env::var(key).ok()?;
    match value.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("Ignoring invalid value for {}: {:?}", key, value);
            None
        }
    }
}

/// Parse `ns=url,ns=url`. Malformed entries are skipped with a warning.
fn parse_endpoints(value: &str) -> BTreeMap<String, String> {
    split_list(value)
        .filter_map(|entry| match entry.split_once('=') {
            Some((ns, url)) if !ns.trim().is_empty() && !url.trim().is_empty() => {
                Some((ns.trim().to_string(), url.trim().to_string()))
            }
            _ => {
                warn!("Ignoring malformed namespace endpoint: {:?}", entry);
                None
            }
        })
        .collect()
}
