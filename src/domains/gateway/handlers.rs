//! Namespace handlers.
//!
//! A handler performs the actual work for every tool in one namespace. It
//! receives the tool's original (unqualified) name and the call arguments.

use std::future::Future;

use serde_json::Value;

/// Executes tools for a single namespace.
///
/// Implement this for stateful handlers; plain async closures of the form
/// `|tool: String, args: Value| async move { ... }` implement it too.
#[async_trait::async_trait]
pub trait NamespaceHandler: Send + Sync {
    /// Execute `tool_name` with `arguments`.
    async fn execute(&self, tool_name: &str, arguments: Value) -> anyhow::Result<Value>;
}

#[async_trait::async_trait]
impl<F, Fut> NamespaceHandler for F
where
    F: Fn(String, Value) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Value>> + Send,
{
    async fn execute(&self, tool_name: &str, arguments: Value) -> anyhow::Result<Value> {
        (self)(tool_name.to_string(), arguments).await
    }
}
