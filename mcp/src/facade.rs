//! MCP Client Facade (spec §4.2): the small surface every caller uses instead
//! of touching a raw `McpClient` directly.

use std::borrow::Cow;

use rmcp::model::{CallToolRequestParam, CallToolResult, Prompt, Resource, Tool};
use serde_json::Map;

use crate::config::{ServerConnection, ServerId};
use crate::error::{McpError, McpResult};
use crate::session::SessionRegistry;

pub struct McpClientFacade {
    registry: std::sync::Arc<SessionRegistry>,
}

impl McpClientFacade {
    pub fn new(registry: std::sync::Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    pub async fn list_tools(&self, server: &ServerConnection) -> McpResult<Vec<Tool>> {
        let client = self.registry.get_or_create(server).await?;
        self.with_timeout(client.peer().list_all_tools()).await
    }

    pub async fn list_resources(&self, server: &ServerConnection) -> McpResult<Vec<Resource>> {
        let client = self.registry.get_or_create(server).await?;
        self.with_timeout(client.peer().list_all_resources()).await
    }

    pub async fn list_prompts(&self, server: &ServerConnection) -> McpResult<Vec<Prompt>> {
        let client = self.registry.get_or_create(server).await?;
        self.with_timeout(client.peer().list_all_prompts()).await
    }

    /// Invoke a tool. An upstream `isError=true` result is surfaced as
    /// [`McpError::ToolError`] carrying the upstream error text rather than
    /// returned as an `Ok` result, so callers don't need to re-check `is_error`.
    pub async fn call_tool(
        &self,
        server: &ServerConnection,
        server_id: &ServerId,
        tool_name: &str,
        arguments: serde_json::Value,
    ) -> McpResult<CallToolResult> {
        let client = self.registry.get_or_create(server).await?;

        let args_map = match arguments {
            serde_json::Value::Object(map) => Some(map),
            serde_json::Value::Null => None,
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                Some(map)
            }
        };

        let request = CallToolRequestParam {
            name: Cow::Owned(tool_name.to_string()),
            arguments: args_map,
        };

        let result = self
            .with_timeout(client.peer().call_tool(request))
            .await
            .map_err(|e| match e {
                McpError::Timeout(_) => McpError::Timeout(format!(
                    "call_tool '{tool_name}' on '{server_id}' timed out"
                )),
                other => other,
            })?;

        if result.is_error.unwrap_or(false) {
            return Err(McpError::ToolError(render_tool_error(&result)));
        }

        Ok(result)
    }

    async fn with_timeout<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T, rmcp::ServiceError>>,
    ) -> McpResult<T> {
        tokio::time::timeout(self.registry.operation_timeout(), fut)
            .await
            .map_err(|_| McpError::Timeout("MCP operation timed out".to_string()))?
            .map_err(|e| McpError::Protocol(e.to_string()))
    }
}

fn render_tool_error(result: &CallToolResult) -> String {
    result
        .content
        .iter()
        .filter_map(|c| c.as_text().map(|t| t.text.clone()))
        .collect::<Vec<_>>()
        .join("\n")
}
