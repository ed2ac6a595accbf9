//! MCP Server implementation and lifecycle management.
//!
//! This module contains the main server handler that implements the MCP
//! protocol on top of the gateway. Tools, prompts and resources are not
//! compiled in; they are whatever discovery currently has in its catalog,
//! so a hot reload is visible on the next `tools/list`.

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, model::*, service::RequestContext,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::config::Config;
use crate::domains::discovery::{DiscoveredPrompt, DiscoveredResource, McpToolInfo, RegistryStats};
use crate::domains::gateway::{GatewayError, McpGateway};

/// The main MCP server handler.
///
/// This struct implements the `ServerHandler` trait from rmcp and answers
/// every request from the gateway's registry snapshot.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Gateway routing tool calls to namespace handlers.
    gateway: Arc<McpGateway>,
}

impl McpServer {
    /// Create a new MCP server over an existing gateway.
    pub fn new(config: Config, gateway: Arc<McpGateway>) -> Self {
        Self {
            config: Arc::new(config),
            gateway,
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn gateway(&self) -> &Arc<McpGateway> {
        &self.gateway
    }

    fn instructions(&self) -> String {
        let namespaces = self.gateway.get_registry().get_namespaces();
        format!(
            "Gateway for discovered MCP servers. Tools are named <namespace>:<tool>. \
             Namespaces: {}",
            namespaces.into_iter().collect::<Vec<_>>().join(", ")
        )
    }

    // ========================================================================
    // HTTP Transport Support Methods
    // ========================================================================

    /// List all available tools (for HTTP transport).
    pub fn list_tools(&self) -> Vec<McpToolInfo> {
        self.gateway.get_registry().get_tools_for_mcp()
    }

    /// Call a tool by qualified name (for HTTP transport).
    ///
    /// Routing failures are errors; handler failures are reported inside
    /// the result with `isError: true`, as on the rmcp transports.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, GatewayError> {
        let result = dispatch(&self.gateway, name, arguments).await?;
        Ok(serde_json::to_value(result).unwrap_or(Value::Null))
    }

    /// List all available prompts (for HTTP transport).
    pub fn list_prompts(&self) -> Vec<DiscoveredPrompt> {
        self.gateway.get_registry().get_all_prompts()
    }

    /// List all available resources (for HTTP transport).
    pub fn list_resources(&self) -> Vec<DiscoveredResource> {
        self.gateway.get_registry().get_all_resources()
    }

    /// Current catalog statistics.
    pub fn stats(&self) -> RegistryStats {
        self.gateway.get_registry().get_stats()
    }
}

/// Execute through the gateway and shape the outcome as an MCP tool result.
async fn dispatch(
    gateway: &McpGateway,
    name: &str,
    arguments: Value,
) -> Result<CallToolResult, GatewayError> {
    match gateway.execute_tool(name, arguments).await {
        Ok(value) => Ok(into_tool_result(value)),
        Err(GatewayError::HandlerExecutionFailed(e)) => {
            warn!("Tool {} failed: {:#}", name, e);
            Ok(CallToolResult::error(vec![Content::text(format!("{:#}", e))]))
        }
        Err(e) => Err(e),
    }
}

/// Results already shaped like an MCP tool result (from a forwarded call)
/// pass through; anything else becomes text content.
fn into_tool_result(value: Value) -> CallToolResult {
    if value.get("content").is_some_and(Value::is_array) {
        if let Ok(result) = serde_json::from_value::<CallToolResult>(value.clone()) {
            return result;
        }
    }

    let text = match value {
        Value::String(s) => s,
        other => serde_json::to_string_pretty(&other).unwrap_or_default(),
    };
    CallToolResult::success(vec![Content::text(text)])
}

fn to_rmcp_tool(info: McpToolInfo) -> Tool {
    let schema = match info.input_schema {
        Value::Object(map) => map,
        _ => JsonObject::new(),
    };
    Tool::new(info.name, info.description, Arc::new(schema))
}

fn to_rmcp_prompt(prompt: DiscoveredPrompt) -> Prompt {
    Prompt {
        name: prompt.name,
        title: None,
        description: Some(prompt.description).filter(|d| !d.is_empty()),
        arguments: prompt.arguments.map(|args| {
            args.into_iter()
                .map(|a| PromptArgument {
                    name: a.name,
                    title: None,
                    description: Some(a.description).filter(|d| !d.is_empty()),
                    required: Some(a.required),
                })
                .collect()
        }),
        icons: None,
        meta: None,
    }
}

fn to_rmcp_resource(resource: DiscoveredResource) -> Resource {
    let mut raw = RawResource::new(resource.uri, resource.name);
    raw.description = Some(resource.description).filter(|d| !d.is_empty());
    raw.mime_type = Some(resource.mime_type);
    raw.no_annotation()
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(self.instructions()),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .enable_prompts()
                .build(),
            ..Default::default()
        }
    }

    #[instrument(skip(self, _context))]
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        info!("Listing tools");
        let tools = McpServer::list_tools(self)
            .into_iter()
            .map(to_rmcp_tool)
            .collect();
        Ok(ListToolsResult {
            tools,
            next_cursor: None,
            meta: None,
        })
    }

    #[instrument(skip(self, _context), fields(tool = %request.name))]
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        info!("Calling tool: {}", request.name);
        let arguments = Value::Object(request.arguments.unwrap_or_default());
        dispatch(&self.gateway, &request.name, arguments)
            .await
            .map_err(|e| McpError::invalid_params(e.to_string(), None))
    }

    #[instrument(skip(self, _context))]
    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, McpError> {
        info!("Listing prompts");
        let prompts = McpServer::list_prompts(self)
            .into_iter()
            .map(to_rmcp_prompt)
            .collect();
        Ok(ListPromptsResult {
            prompts,
            next_cursor: None,
            meta: None,
        })
    }

    #[instrument(skip(self, _context))]
    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        info!("Listing resources");
        let resources = McpServer::list_resources(self)
            .into_iter()
            .map(to_rmcp_resource)
            .collect();
        Ok(ListResourcesResult {
            resources,
            next_cursor: None,
            meta: None,
        })
    }
}
