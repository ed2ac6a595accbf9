//! MCP Gateway - routes qualified tool calls to namespace handlers.
//!
//! The registry knows which tools exist; the gateway knows who can run them.
//! Handlers may be registered before or after their tools are discovered,
//! and hot reload never requires re-registration.
//!
//! The gateway imposes no timeout. A handler future that never resolves is
//! held only by its caller; cancellation is the caller's or handler's job.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::error::GatewayError;
use super::forward::HttpForwardHandler;
use super::handlers::NamespaceHandler;
use crate::core::config::{DiscoveryConfig, HandlersConfig};
use crate::core::Error;
use crate::domains::discovery::{DiscoveryError, RegistryStats, ToolRegistry};

/// Bridges the discovered catalog to live execution.
pub struct McpGateway {
    registry: ToolRegistry,
    handlers: RwLock<HashMap<String, Arc<dyn NamespaceHandler>>>,
}

impl McpGateway {
    /// Wrap an existing registry.
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry,
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Build a gateway over a fresh registry.
    pub fn from_config(config: DiscoveryConfig) -> Result<Self, DiscoveryError> {
        Ok(Self::new(ToolRegistry::new(config)?))
    }

    /// Build a gateway over a fresh registry and forward every configured
    /// namespace to its remote endpoint.
    pub fn from_settings(
        discovery: DiscoveryConfig,
        handlers: &HandlersConfig,
    ) -> crate::core::Result<Self> {
        let gateway = Self::from_config(discovery)?;
        for (namespace, endpoint) in &handlers.endpoints {
            let handler = HttpForwardHandler::new(endpoint.as_str(), handlers.timeout())
                .map_err(|e| Error::forward_handler(namespace.as_str(), e))?;
            gateway.register_namespace_handler(namespace.as_str(), handler);
        }
        Ok(gateway)
    }

    pub fn get_registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Run discovery. Delegates to [`ToolRegistry::initialize`].
    pub async fn initialize(&self) -> RegistryStats {
        self.registry.initialize().await
    }

    /// Stop hot reload. Idempotent.
    pub fn stop(&self) {
        self.registry.stop_watching();
    }

    // ========================================================================
    // Handler table
    // ========================================================================

    /// Install or replace the handler for `namespace`.
    pub fn register_namespace_handler<H>(&self, namespace: impl Into<String>, handler: H)
    where
        H: NamespaceHandler + 'static,
    {
        self.register_shared_handler(namespace, Arc::new(handler));
    }

    /// Install or replace the handler for `namespace` with a shared handler.
    pub fn register_shared_handler(
        &self,
        namespace: impl Into<String>,
        handler: Arc<dyn NamespaceHandler>,
    ) {
        let namespace = namespace.into();
        if self
            .handlers
            .write()
            .insert(namespace.clone(), handler)
            .is_some()
        {
            info!("Replaced handler for namespace '{}'", namespace);
        } else {
            info!("Registered handler for namespace '{}'", namespace);
        }
    }

    /// Remove the handler for `namespace`. Returns `false` if none was set.
    pub fn unregister_namespace_handler(&self, namespace: &str) -> bool {
        self.handlers.write().remove(namespace).is_some()
    }

    pub fn has_handler(&self, namespace: &str) -> bool {
        self.handlers.read().contains_key(namespace)
    }

    /// Namespaces with a registered handler, sorted.
    pub fn registered_namespaces(&self) -> Vec<String> {
        let mut namespaces: Vec<_> = self.handlers.read().keys().cloned().collect();
        namespaces.sort();
        namespaces
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Execute a tool by its qualified `<namespace>:<tool>` name.
    ///
    /// Handler failures are returned as
    /// [`GatewayError::HandlerExecutionFailed`] carrying the handler's own
    /// error; nothing is retried.
    #[instrument(skip(self, arguments))]
    pub async fn execute_tool(
        &self,
        qualified_name: &str,
        arguments: Value,
    ) -> Result<Value, GatewayError> {
        let Some(tool) = self.registry.get_tool(qualified_name) else {
            warn!("Unknown tool requested: {}", qualified_name);
            return Err(GatewayError::tool_not_found(qualified_name));
        };

        // Route on the catalog record, not on a re-split of the name.
        let handler = self
            .handlers
            .read()
            .get(&tool.namespace)
            .cloned()
            .ok_or_else(|| GatewayError::handler_not_found(&tool.namespace))?;

        let started = Instant::now();
        let result = handler
            .execute(&tool.original_name, arguments)
            .await
            .map_err(GatewayError::HandlerExecutionFailed);

        debug!(
            "Tool {} finished in {:?} (ok: {})",
            qualified_name,
            started.elapsed(),
            result.is_ok()
        );
        result
    }
}
