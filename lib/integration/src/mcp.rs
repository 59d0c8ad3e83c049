//! JSON-RPC 2.0 tool gateway.
//!
//! Speaks the `tools/list` and `tools/call` methods of a tool server over a
//! single HTTP endpoint. Calls never fail: transport errors, JSON-RPC error
//! objects and `isError` results come back as error payloads.

use crate::error::GatewayError;
use crate::transport::HttpTransport;
use async_trait::async_trait;
use cookbook_conversation::{ToolCatalog, ToolDefinition, ToolError, ToolGateway, ToolOutput};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::instrument;

/// Configuration for the tool server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolGatewayConfig {
    /// JSON-RPC endpoint URL.
    pub endpoint: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_timeout_seconds() -> u64 {
    30
}

impl ToolGatewayConfig {
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// Tool gateway backed by a JSON-RPC tool server.
#[derive(Debug)]
pub struct McpToolGateway {
    transport: HttpTransport,
    next_id: AtomicU64,
}

impl McpToolGateway {
    pub fn new(config: &ToolGatewayConfig) -> cookbook_core::Result<Self, GatewayError> {
        let transport = HttpTransport::new(
            &config.endpoint,
            None,
            Duration::from_secs(config.timeout_seconds),
        )?;
        Ok(Self {
            transport,
            next_id: AtomicU64::new(1),
        })
    }

    async fn call(&self, method: &str, params: Option<JsonValue>) -> Result<JsonValue, GatewayError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };
        let response: RpcResponse = self.transport.post_json("", &request).await?;
        if let Some(error) = response.error {
            return Err(GatewayError::Remote {
                code: error.code,
                message: error.message,
            });
        }
        Ok(response.result.unwrap_or_else(|| JsonValue::Object(serde_json::Map::new())))
    }
}

#[async_trait]
impl ToolGateway for McpToolGateway {
    #[instrument(skip(self), fields(endpoint = %self.transport.base_url()))]
    async fn list_tools(&self) -> Result<ToolCatalog, ToolError> {
        let result = self.call("tools/list", None).await?;
        let listing: ToolListing =
            serde_json::from_value(result).map_err(|e| ToolError::DiscoveryFailed {
                reason: e.to_string(),
            })?;
        let catalog: ToolCatalog = listing.tools.into_iter().collect();
        tracing::info!(tools = ?catalog.names(), "discovered tools");
        Ok(catalog)
    }

    #[instrument(skip(self, input), fields(endpoint = %self.transport.base_url()))]
    async fn invoke(&self, name: &str, input: JsonValue) -> ToolOutput {
        let params = serde_json::json!({ "name": name, "arguments": input });
        match self.call("tools/call", Some(params)).await {
            Ok(result) => {
                let is_error = result
                    .get("isError")
                    .and_then(JsonValue::as_bool)
                    .unwrap_or(false);
                ToolOutput {
                    payload: result,
                    is_error,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "tool call failed");
                ToolOutput::failure(e.to_string())
            }
        }
    }
}

/// Gateway used when no tool server is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredGateway;

#[async_trait]
impl ToolGateway for UnconfiguredGateway {
    async fn list_tools(&self) -> Result<ToolCatalog, ToolError> {
        Ok(ToolCatalog::new())
    }

    async fn invoke(&self, _name: &str, _input: JsonValue) -> ToolOutput {
        ToolOutput::failure(ToolError::NotConfigured.to_string())
    }
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<JsonValue>,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<JsonValue>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct ToolListing {
    #[serde(default)]
    tools: Vec<ToolDefinition>,
}
