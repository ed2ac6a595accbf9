//! Forwarding handler for namespaces served by a remote MCP endpoint.
//!
//! Each call is sent as a JSON-RPC `tools/call` request over HTTP POST.
//! Only the tool's original name crosses the wire; the namespace prefix
//! stays on this side of the gateway.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{Context, bail};
use serde_json::{Value, json};
use tracing::{debug, instrument};

use super::handlers::NamespaceHandler;

/// Forwards tool calls for one namespace to a remote endpoint.
pub struct HttpForwardHandler {
    endpoint: String,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl HttpForwardHandler {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl NamespaceHandler for HttpForwardHandler {
    #[instrument(skip(self, arguments), fields(endpoint = %self.endpoint))]
    async fn execute(&self, tool_name: &str, arguments: Value) -> anyhow::Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = rpc_request(id, tool_name, arguments);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            bail!("{} returned HTTP {}", self.endpoint, status);
        }

        let body: Value = response
            .json()
            .await
            .context("Response body is not valid JSON")?;
        debug!("tools/call {} answered (id {})", tool_name, id);

        parse_rpc_response(body)
    }
}

fn rpc_request(id: u64, tool_name: &str, arguments: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": {
            "name": tool_name,
            "arguments": arguments,
        },
    })
}

fn parse_rpc_response(mut body: Value) -> anyhow::Result<Value> {
    if let Some(error) = body.get("error") {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or_default();
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        bail!("Remote error {}: {}", code, message);
    }

    match body.get_mut("result") {
        Some(result) => Ok(result.take()),
        None => bail!("Response has neither result nor error"),
    }
}
