//! Gateway-specific error types.

use thiserror::Error;

/// Errors surfaced by [`McpGateway::execute_tool`](super::McpGateway::execute_tool).
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The qualified name is not in the registry's catalog.
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// The tool's namespace has no registered handler.
    #[error("No handler registered for namespace: {0}")]
    HandlerNotFound(String),

    /// The handler itself failed. Its error is passed through untouched.
    #[error(transparent)]
    HandlerExecutionFailed(anyhow::Error),
}

impl GatewayError {
    /// Create a new "tool not found" error.
    pub fn tool_not_found(name: impl Into<String>) -> Self {
        Self::ToolNotFound(name.into())
    }

    /// Create a new "handler not found" error.
    pub fn handler_not_found(namespace: impl Into<String>) -> Self {
        Self::HandlerNotFound(namespace.into())
    }

    /// The handler's own error, if this is an execution failure.
    pub fn handler_error(&self) -> Option<&anyhow::Error> {
        match self {
            Self::HandlerExecutionFailed(e) => Some(e),
            _ => None,
        }
    }
}
