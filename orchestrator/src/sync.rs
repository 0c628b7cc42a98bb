//! MCP server capability sync job (spec §6, `POST /mcp/servers/{id}/sync`):
//! refreshes a server's cached tools/resources/prompts and bumps its version.

use std::sync::Arc;

use conduit_mcp::{McpClientFacade, ServerConnection};
use conduit_persistence::{ConversationStore, McpSyncStatus};
use serde_json::Value;

use crate::error::{OrchestratorError, OrchestratorResult};

pub struct ServerSyncJob {
    store: Arc<dyn ConversationStore>,
    facade: Arc<McpClientFacade>,
}

impl ServerSyncJob {
    pub fn new(store: Arc<dyn ConversationStore>, facade: Arc<McpClientFacade>) -> Self {
        Self { store, facade }
    }

    /// Lists tools, resources, and prompts for `server` and writes the
    /// refreshed caches. A partial failure still persists whatever lists
    /// succeeded and records `SYNC_FAILED` rather than losing prior caches.
    pub async fn sync(&self, server: &ServerConnection) -> OrchestratorResult<()> {
        let tools = self.facade.list_tools(server).await;
        let resources = self.facade.list_resources(server).await;
        let prompts = self.facade.list_prompts(server).await;

        let any_failed = tools.is_err() || resources.is_err() || prompts.is_err();

        let tools_cache = tools.map(|t| serde_json::to_value(t).unwrap_or(Value::Null)).unwrap_or(Value::Null);
        let resources_cache = resources.map(|r| serde_json::to_value(r).unwrap_or(Value::Null)).unwrap_or(Value::Null);
        let prompts_cache = prompts.map(|p| serde_json::to_value(p).unwrap_or(Value::Null)).unwrap_or(Value::Null);

        let sync_status = if any_failed { McpSyncStatus::SyncFailed } else { McpSyncStatus::Synced };

        self.store
            .upsert_mcp_server_capabilities(
                server.server_id.as_str(),
                tools_cache,
                resources_cache,
                prompts_cache,
                sync_status,
            )
            .await
            .map_err(OrchestratorError::from)?;

        if any_failed {
            return Err(OrchestratorError::TransportError(format!(
                "sync for '{}' completed with partial failures",
                server.server_id
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_mcp::{McpTransportKind, ServerId, SessionRegistry, SessionRegistryConfig};
    use conduit_persistence::InMemoryConversationStore;

    fn sample_server() -> ServerConnection {
        ServerConnection {
            server_id: ServerId::from("srv1"),
            name: "weather".to_string(),
            base_url: "https://weather.example/mcp".to_string(),
            api_key: None,
            transport: McpTransportKind::Sse,
            proxy: None,
        }
    }

    #[tokio::test]
    async fn sync_against_unreachable_server_reports_partial_failure() {
        let store = Arc::new(InMemoryConversationStore::new());
        let registry = SessionRegistry::new(SessionRegistryConfig::default());
        let facade = Arc::new(McpClientFacade::new(registry));
        let job = ServerSyncJob::new(store.clone(), facade);

        store.seed_server(conduit_persistence::McpServer {
            id: 1,
            server_id: "srv1".to_string(),
            name: "weather".to_string(),
            base_url: "https://weather.example/mcp".to_string(),
            api_key_enc: None,
            transport: conduit_persistence::McpTransportKind::Sse,
            status: conduit_persistence::McpServerStatus::Idle,
            sync_status: conduit_persistence::McpSyncStatus::NeverSynced,
            tools_cache: Value::Null,
            resources_cache: Value::Null,
            prompts_cache: Value::Null,
            last_synced_at: None,
            version: 0,
            last_updated: chrono::Utc::now(),
        });

        let result = job.sync(&sample_server()).await;
        assert!(result.is_err());

        let server = store.get_mcp_server("srv1").await.unwrap();
        assert!(matches!(server.sync_status, conduit_persistence::McpSyncStatus::SyncFailed));
        assert_eq!(server.version, 1);
    }
}
