//! Approval Policy Service (spec §4.4): resolves whether a tool call must be
//! gated behind an `mcp_approval_request` before it runs.
//!
//! Policy is a simple per-`(server, tool)` ALWAYS|NEVER flag persisted
//! through [`ConversationStore`]; annotation-derived defaults only seed the
//! *initial* value a caller chooses to write, they aren't consulted here.

use std::sync::Arc;

use conduit_persistence::{ApprovalPolicyKind, ConversationStore, PersistenceError};

use crate::config::ServerId;
use crate::error::{McpError, McpResult};

pub struct ApprovalPolicyService {
    store: Arc<dyn ConversationStore>,
}

impl ApprovalPolicyService {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }

    /// `true` if `tool_name` on `server_id` requires an approval round trip.
    /// Absence of a stored policy means "never require approval".
    pub async fn requires_approval(&self, server_id: &ServerId, tool_name: &str) -> McpResult<bool> {
        let policy = self
            .store
            .get_approval_policy(server_id.as_str(), tool_name)
            .await
            .map_err(to_mcp_error)?;
        Ok(matches!(policy, ApprovalPolicyKind::Always))
    }

    pub async fn set_policy(&self, server_id: &ServerId, tool_name: &str, policy: ApprovalPolicyKind) -> McpResult<()> {
        self.store
            .set_approval_policy(server_id.as_str(), tool_name, policy)
            .await
            .map_err(to_mcp_error)
    }

    pub async fn list_policies(&self, server_id: &ServerId) -> McpResult<Vec<(String, ApprovalPolicyKind)>> {
        self.store
            .list_approval_policies_for_server(server_id.as_str())
            .await
            .map_err(to_mcp_error)
    }

    pub async fn clear_policies(&self, server_id: &ServerId) -> McpResult<()> {
        self.store
            .delete_approval_policies_for_server(server_id.as_str())
            .await
            .map_err(to_mcp_error)
    }
}

fn to_mcp_error(e: PersistenceError) -> McpError {
    McpError::Config(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_persistence::InMemoryConversationStore;

    #[tokio::test]
    async fn defaults_to_no_approval_required() {
        let service = ApprovalPolicyService::new(Arc::new(InMemoryConversationStore::new()));
        let server_id = ServerId::from("srv1");
        assert!(!service.requires_approval(&server_id, "get_weather").await.unwrap());
    }

    #[tokio::test]
    async fn set_policy_to_always_is_observed() {
        let service = ApprovalPolicyService::new(Arc::new(InMemoryConversationStore::new()));
        let server_id = ServerId::from("srv1");
        service
            .set_policy(&server_id, "delete_forecast", ApprovalPolicyKind::Always)
            .await
            .unwrap();
        assert!(service.requires_approval(&server_id, "delete_forecast").await.unwrap());
        assert!(!service.requires_approval(&server_id, "get_weather").await.unwrap());
    }
}
