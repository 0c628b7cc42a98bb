//! Tool Definition Provider (spec §4.5): turns each configured MCP server's
//! *cached* tool list into the `tools` array of an outgoing Responses
//! request, split into one block per resolved approval policy so upstream
//! only ever sees a single `require_approval` value per block.
//!
//! Tool names are read from the server's persisted `toolsCache`, never from
//! a live `tools/list` call — the cache is the authoritative source of tool
//! declarations injected into a turn (spec §3, §4.5 step 1).

use std::sync::Arc;

use openai_protocol::responses::{RequireApproval, ResponseTool, ResponseToolType};

use crate::approval::ApprovalPolicyService;
use crate::config::ServerConnection;
use crate::error::McpResult;

/// A server eligible for tool injection into a turn: how to reach it, plus
/// the tool names currently in its persisted `toolsCache`.
pub struct ConnectedServer {
    pub connection: ServerConnection,
    pub tool_names: Vec<String>,
}

pub struct ToolDefinitionProvider {
    policies: Arc<ApprovalPolicyService>,
}

impl ToolDefinitionProvider {
    pub fn new(policies: Arc<ApprovalPolicyService>) -> Self {
        Self { policies }
    }

    /// Build the complete `tools` array for a request spanning `servers`.
    /// A server whose cache holds zero tool names is silently skipped.
    pub async fn build_tools(&self, servers: &[ConnectedServer]) -> McpResult<Vec<ResponseTool>> {
        let mut blocks = Vec::new();
        for server in servers {
            if server.tool_names.is_empty() {
                continue;
            }

            let mut always_approve = Vec::new();
            let mut never_approve = Vec::new();
            for name in &server.tool_names {
                if self.policies.requires_approval(&server.connection.server_id, name).await? {
                    always_approve.push(name.clone());
                } else {
                    never_approve.push(name.clone());
                }
            }

            if !always_approve.is_empty() {
                blocks.push(server_block(&server.connection, always_approve, RequireApproval::Always));
            }
            if !never_approve.is_empty() {
                blocks.push(server_block(&server.connection, never_approve, RequireApproval::Never));
            }
        }
        Ok(blocks)
    }
}

fn server_block(server: &ServerConnection, allowed_tools: Vec<String>, require_approval: RequireApproval) -> ResponseTool {
    ResponseTool {
        r#type: ResponseToolType::Mcp,
        function: None,
        server_url: Some(server.base_url.clone()),
        authorization: server.api_key.clone(),
        headers: None,
        server_label: Some(server.server_id.to_string()),
        server_description: Some(server.name.clone()),
        require_approval: Some(require_approval),
        allowed_tools: Some(allowed_tools),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use conduit_persistence::InMemoryConversationStore;

    use super::*;
    use crate::config::{McpTransportKind, ServerId};

    fn sample_server() -> ServerConnection {
        ServerConnection {
            server_id: ServerId::from("srv1"),
            name: "weather".to_string(),
            base_url: "https://weather.example/mcp".to_string(),
            api_key: Some("sk-test".to_string()),
            transport: McpTransportKind::Sse,
            proxy: None,
        }
    }

    #[test]
    fn server_block_keys_server_label_on_server_id_not_name() {
        let server = sample_server();
        let block = server_block(&server, vec!["get_weather".to_string()], RequireApproval::Never);
        assert_eq!(block.server_label.as_deref(), Some("srv1"));
        assert_eq!(block.server_description.as_deref(), Some("weather"));
        assert_eq!(block.server_url.as_deref(), Some("https://weather.example/mcp"));
        assert_eq!(block.allowed_tools.as_deref(), Some(&["get_weather".to_string()][..]));
        assert_eq!(block.require_approval, Some(RequireApproval::Never));
    }

    #[tokio::test]
    async fn build_tools_reads_cached_tool_names_without_a_live_list_call() {
        let store = Arc::new(InMemoryConversationStore::new());
        let policies = Arc::new(ApprovalPolicyService::new(store));
        let provider = ToolDefinitionProvider::new(policies);

        let connected = ConnectedServer {
            connection: sample_server(),
            tool_names: vec!["get_weather".to_string(), "get_forecast".to_string()],
        };

        let tools = provider.build_tools(&[connected]).await.unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].require_approval, Some(RequireApproval::Never));
        assert_eq!(
            tools[0].allowed_tools.as_deref().map(|t| t.len()),
            Some(2)
        );
    }

    #[tokio::test]
    async fn build_tools_skips_a_server_with_an_empty_cache() {
        let store = Arc::new(InMemoryConversationStore::new());
        let policies = Arc::new(ApprovalPolicyService::new(store));
        let provider = ToolDefinitionProvider::new(policies);

        let connected = ConnectedServer {
            connection: sample_server(),
            tool_names: Vec::new(),
        };

        let tools = provider.build_tools(&[connected]).await.unwrap();
        assert!(tools.is_empty());
    }
}
