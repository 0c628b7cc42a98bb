//! The Persistence Port (spec §4's "Persistence Port" leaf): the trait every
//! other component writes through, plus an in-memory stand-in for tests.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::PersistenceResult;
use crate::model::{
    ApprovalPolicyKind, Conversation, ConversationStatus, McpServer, McpServerStatus,
    McpSyncStatus, McpTransportKind, Message, MessageRole, ToolCall, ToolCallStatus, ToolCallType,
};

/// The advancement order of [`ToolCallStatus`] used to resolve concurrent
/// upserts to the same `(conversationId, itemId)` row: a write never moves a
/// row backwards (spec Testable Property 1, 8).
fn status_rank(status: ToolCallStatus) -> u8 {
    match status {
        ToolCallStatus::InProgress => 0,
        ToolCallStatus::Completed | ToolCallStatus::Failed => 1,
    }
}

/// Abstract storage for conversations, messages, tool calls, MCP server
/// records, and per-tool approval policies (spec §3, §4.4).
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn create_conversation(&self, title: Option<String>) -> PersistenceResult<Conversation>;
    async fn get_conversation(&self, id: i64) -> PersistenceResult<Conversation>;
    async fn update_conversation_status(
        &self,
        id: i64,
        status: ConversationStatus,
        completion_reason: Option<String>,
    ) -> PersistenceResult<()>;
    async fn set_conversation_response_id(&self, id: i64, response_id: String) -> PersistenceResult<()>;

    /// Create-or-append: if no row exists for `(conversation_id, item_id)` yet,
    /// creates one with `content`; otherwise appends `content` to the existing
    /// row (the delta-accumulation case for streamed assistant text).
    #[allow(clippy::too_many_arguments)]
    async fn upsert_message(
        &self,
        conversation_id: i64,
        item_id: Option<&str>,
        role: MessageRole,
        output_index: Option<i32>,
        content: &str,
    ) -> PersistenceResult<Message>;

    async fn finalize_message_content(
        &self,
        conversation_id: i64,
        item_id: &str,
        content: String,
        raw_json: Option<Value>,
    ) -> PersistenceResult<Message>;

    /// Create-or-update a ToolCall row keyed by `(conversation_id, item_id)`.
    /// `r#type`/`name` are fixed by the first call that creates the row
    /// ("first event wins"); a later status is only applied if it is at least
    /// as advanced as the stored one.
    #[allow(clippy::too_many_arguments)]
    async fn upsert_tool_call(
        &self,
        conversation_id: i64,
        item_id: &str,
        r#type: ToolCallType,
        name: Option<String>,
        output_index: Option<i32>,
        arguments_json: Option<Value>,
        status: ToolCallStatus,
    ) -> PersistenceResult<ToolCall>;

    async fn mark_tool_call_status(
        &self,
        conversation_id: i64,
        item_id: &str,
        status: ToolCallStatus,
        result_json: Option<Value>,
    ) -> PersistenceResult<ToolCall>;

    #[allow(clippy::too_many_arguments)]
    async fn create_mcp_server(
        &self,
        server_id: &str,
        name: String,
        base_url: String,
        api_key_enc: Option<Vec<u8>>,
        transport: McpTransportKind,
    ) -> PersistenceResult<McpServer>;
    async fn get_mcp_server(&self, server_id: &str) -> PersistenceResult<McpServer>;
    async fn list_mcp_servers(&self) -> PersistenceResult<Vec<McpServer>>;
    async fn delete_mcp_server(&self, server_id: &str) -> PersistenceResult<()>;

    async fn set_mcp_server_status(&self, server_id: &str, status: McpServerStatus) -> PersistenceResult<()>;

    /// Compare-and-swap write of the three capability caches, bumping `version`.
    /// Retries up to 3 times with exponential backoff (10/20/40ms) on conflict
    /// with a concurrent writer (spec §5).
    async fn upsert_mcp_server_capabilities(
        &self,
        server_id: &str,
        tools_cache: Value,
        resources_cache: Value,
        prompts_cache: Value,
        sync_status: McpSyncStatus,
    ) -> PersistenceResult<McpServer>;

    /// Defaults to `NEVER` when no row exists for `(server_id, tool_name)`.
    async fn get_approval_policy(&self, server_id: &str, tool_name: &str) -> PersistenceResult<ApprovalPolicyKind>;
    async fn list_approval_policies_for_server(
        &self,
        server_id: &str,
    ) -> PersistenceResult<Vec<(String, ApprovalPolicyKind)>>;
    async fn set_approval_policy(
        &self,
        server_id: &str,
        tool_name: &str,
        policy: ApprovalPolicyKind,
    ) -> PersistenceResult<()>;
    async fn delete_approval_policies_for_server(&self, server_id: &str) -> PersistenceResult<()>;
}

/// In-process stand-in for [`ConversationStore`], used by the orchestrator's
/// own unit/integration tests.
pub mod memory {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Default)]
    struct State {
        next_conversation_id: i64,
        next_message_id: i64,
        next_tool_call_id: i64,
        conversations: HashMap<i64, Conversation>,
        messages_by_item: HashMap<(i64, String), i64>,
        messages: HashMap<i64, Message>,
        tool_calls_by_item: HashMap<(i64, String), i64>,
        tool_calls: HashMap<i64, ToolCall>,
        servers: HashMap<String, McpServer>,
        policies: HashMap<(String, String), ApprovalPolicyKind>,
    }

    pub struct InMemoryConversationStore {
        state: Mutex<State>,
    }

    impl Default for InMemoryConversationStore {
        fn default() -> Self {
            Self::new()
        }
    }

    impl InMemoryConversationStore {
        pub fn new() -> Self {
            Self {
                state: Mutex::new(State::default()),
            }
        }

        /// Test/bootstrap helper: seed a server row directly.
        pub fn seed_server(&self, server: McpServer) {
            self.state.lock().servers.insert(server.server_id.clone(), server);
        }
    }

    #[async_trait]
    impl ConversationStore for InMemoryConversationStore {
        async fn create_conversation(&self, title: Option<String>) -> PersistenceResult<Conversation> {
            let mut state = self.state.lock();
            state.next_conversation_id += 1;
            let id = state.next_conversation_id;
            let now = chrono::Utc::now();
            let conversation = Conversation {
                id,
                title,
                status: ConversationStatus::Created,
                response_id: None,
                completion_reason: None,
                created_at: now,
                updated_at: now,
            };
            state.conversations.insert(id, conversation.clone());
            Ok(conversation)
        }

        async fn get_conversation(&self, id: i64) -> PersistenceResult<Conversation> {
            self.state
                .lock()
                .conversations
                .get(&id)
                .cloned()
                .ok_or_else(|| crate::error::PersistenceError::NotFound(format!("conversation {id}")))
        }

        async fn update_conversation_status(
            &self,
            id: i64,
            status: ConversationStatus,
            completion_reason: Option<String>,
        ) -> PersistenceResult<()> {
            let mut state = self.state.lock();
            let conv = state
                .conversations
                .get_mut(&id)
                .ok_or_else(|| crate::error::PersistenceError::NotFound(format!("conversation {id}")))?;
            conv.status = status;
            conv.completion_reason = completion_reason;
            conv.updated_at = chrono::Utc::now();
            Ok(())
        }

        async fn set_conversation_response_id(&self, id: i64, response_id: String) -> PersistenceResult<()> {
            let mut state = self.state.lock();
            let conv = state
                .conversations
                .get_mut(&id)
                .ok_or_else(|| crate::error::PersistenceError::NotFound(format!("conversation {id}")))?;
            conv.response_id = Some(response_id);
            conv.updated_at = chrono::Utc::now();
            Ok(())
        }

        async fn upsert_message(
            &self,
            conversation_id: i64,
            item_id: Option<&str>,
            role: MessageRole,
            output_index: Option<i32>,
            content: &str,
        ) -> PersistenceResult<Message> {
            let mut state = self.state.lock();
            let now = chrono::Utc::now();

            if let Some(item_id) = item_id {
                if let Some(&id) = state.messages_by_item.get(&(conversation_id, item_id.to_string())) {
                    let msg = state.messages.get_mut(&id).expect("indexed message must exist");
                    msg.content.push_str(content);
                    return Ok(msg.clone());
                }
            }

            state.next_message_id += 1;
            let id = state.next_message_id;
            let message = Message {
                id,
                conversation_id,
                role,
                content: content.to_string(),
                raw_json: None,
                output_index,
                item_id: item_id.map(str::to_string),
                created_at: now,
            };
            if let Some(item_id) = item_id {
                state
                    .messages_by_item
                    .insert((conversation_id, item_id.to_string()), id);
            }
            state.messages.insert(id, message.clone());
            Ok(message)
        }

        async fn finalize_message_content(
            &self,
            conversation_id: i64,
            item_id: &str,
            content: String,
            raw_json: Option<Value>,
        ) -> PersistenceResult<Message> {
            let mut state = self.state.lock();
            let key = (conversation_id, item_id.to_string());
            let id = *state
                .messages_by_item
                .get(&key)
                .ok_or_else(|| crate::error::PersistenceError::NotFound(format!("message {item_id}")))?;
            let msg = state.messages.get_mut(&id).expect("indexed message must exist");
            msg.content = content;
            msg.raw_json = raw_json;
            Ok(msg.clone())
        }

        async fn upsert_tool_call(
            &self,
            conversation_id: i64,
            item_id: &str,
            r#type: ToolCallType,
            name: Option<String>,
            output_index: Option<i32>,
            arguments_json: Option<Value>,
            status: ToolCallStatus,
        ) -> PersistenceResult<ToolCall> {
            let mut state = self.state.lock();
            let now = chrono::Utc::now();
            let key = (conversation_id, item_id.to_string());

            if let Some(&id) = state.tool_calls_by_item.get(&key) {
                let row = state.tool_calls.get_mut(&id).expect("indexed tool_call must exist");
                if arguments_json.is_some() {
                    row.arguments_json = arguments_json;
                }
                if name.is_some() {
                    row.name = row.name.clone().or(name);
                }
                if status_rank(status) >= status_rank(row.status) {
                    row.status = status;
                }
                row.updated_at = now;
                return Ok(row.clone());
            }

            state.next_tool_call_id += 1;
            let id = state.next_tool_call_id;
            let row = ToolCall {
                id,
                conversation_id,
                r#type,
                name,
                item_id: item_id.to_string(),
                arguments_json,
                result_json: None,
                status,
                output_index,
                created_at: now,
                updated_at: now,
            };
            state.tool_calls_by_item.insert(key, id);
            state.tool_calls.insert(id, row.clone());
            Ok(row)
        }

        async fn mark_tool_call_status(
            &self,
            conversation_id: i64,
            item_id: &str,
            status: ToolCallStatus,
            result_json: Option<Value>,
        ) -> PersistenceResult<ToolCall> {
            let mut state = self.state.lock();
            let key = (conversation_id, item_id.to_string());
            let id = *state
                .tool_calls_by_item
                .get(&key)
                .ok_or_else(|| crate::error::PersistenceError::NotFound(format!("tool_call {item_id}")))?;
            let row = state.tool_calls.get_mut(&id).expect("indexed tool_call must exist");
            if status_rank(status) >= status_rank(row.status) {
                row.status = status;
            }
            if result_json.is_some() {
                row.result_json = result_json;
            }
            row.updated_at = chrono::Utc::now();
            Ok(row.clone())
        }

        async fn create_mcp_server(
            &self,
            server_id: &str,
            name: String,
            base_url: String,
            api_key_enc: Option<Vec<u8>>,
            transport: McpTransportKind,
        ) -> PersistenceResult<McpServer> {
            let mut state = self.state.lock();
            if state.servers.contains_key(server_id) {
                return Err(crate::error::PersistenceError::Serialization(format!(
                    "mcp server {server_id} already exists"
                )));
            }
            let now = chrono::Utc::now();
            let server = McpServer {
                id: state.servers.len() as i64 + 1,
                server_id: server_id.to_string(),
                name,
                base_url,
                api_key_enc,
                transport,
                status: McpServerStatus::Idle,
                sync_status: McpSyncStatus::NeverSynced,
                tools_cache: Value::Null,
                resources_cache: Value::Null,
                prompts_cache: Value::Null,
                last_synced_at: None,
                version: 0,
                last_updated: now,
            };
            state.servers.insert(server_id.to_string(), server.clone());
            Ok(server)
        }

        async fn get_mcp_server(&self, server_id: &str) -> PersistenceResult<McpServer> {
            self.state
                .lock()
                .servers
                .get(server_id)
                .cloned()
                .ok_or_else(|| crate::error::PersistenceError::NotFound(format!("mcp server {server_id}")))
        }

        async fn list_mcp_servers(&self) -> PersistenceResult<Vec<McpServer>> {
            Ok(self.state.lock().servers.values().cloned().collect())
        }

        async fn delete_mcp_server(&self, server_id: &str) -> PersistenceResult<()> {
            let mut state = self.state.lock();
            state
                .servers
                .remove(server_id)
                .ok_or_else(|| crate::error::PersistenceError::NotFound(format!("mcp server {server_id}")))?;
            Ok(())
        }

        async fn set_mcp_server_status(&self, server_id: &str, status: McpServerStatus) -> PersistenceResult<()> {
            let mut state = self.state.lock();
            let server = state
                .servers
                .get_mut(server_id)
                .ok_or_else(|| crate::error::PersistenceError::NotFound(format!("mcp server {server_id}")))?;
            server.status = status;
            server.last_updated = chrono::Utc::now();
            Ok(())
        }

        async fn upsert_mcp_server_capabilities(
            &self,
            server_id: &str,
            tools_cache: Value,
            resources_cache: Value,
            prompts_cache: Value,
            sync_status: McpSyncStatus,
        ) -> PersistenceResult<McpServer> {
            let mut state = self.state.lock();
            let server = state
                .servers
                .get_mut(server_id)
                .ok_or_else(|| crate::error::PersistenceError::NotFound(format!("mcp server {server_id}")))?;
            server.tools_cache = tools_cache;
            server.resources_cache = resources_cache;
            server.prompts_cache = prompts_cache;
            server.sync_status = sync_status;
            server.version += 1;
            server.last_synced_at = Some(chrono::Utc::now());
            server.last_updated = chrono::Utc::now();
            Ok(server.clone())
        }

        async fn get_approval_policy(&self, server_id: &str, tool_name: &str) -> PersistenceResult<ApprovalPolicyKind> {
            Ok(self
                .state
                .lock()
                .policies
                .get(&(server_id.to_string(), tool_name.to_string()))
                .copied()
                .unwrap_or(ApprovalPolicyKind::Never))
        }

        async fn list_approval_policies_for_server(
            &self,
            server_id: &str,
        ) -> PersistenceResult<Vec<(String, ApprovalPolicyKind)>> {
            Ok(self
                .state
                .lock()
                .policies
                .iter()
                .filter(|((sid, _), _)| sid == server_id)
                .map(|((_, tool), policy)| (tool.clone(), *policy))
                .collect())
        }

        async fn set_approval_policy(
            &self,
            server_id: &str,
            tool_name: &str,
            policy: ApprovalPolicyKind,
        ) -> PersistenceResult<()> {
            self.state
                .lock()
                .policies
                .insert((server_id.to_string(), tool_name.to_string()), policy);
            Ok(())
        }

        async fn delete_approval_policies_for_server(&self, server_id: &str) -> PersistenceResult<()> {
            self.state.lock().policies.retain(|(sid, _), _| sid != server_id);
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn tool_call_upsert_converges_to_most_advanced_status() {
            let store = InMemoryConversationStore::new();
            let conv = store.create_conversation(None).await.unwrap();

            store
                .upsert_tool_call(
                    conv.id,
                    "fc1",
                    ToolCallType::Function,
                    Some("get_weather".to_string()),
                    Some(0),
                    Some(serde_json::json!({"city": "Berlin"})),
                    ToolCallStatus::InProgress,
                )
                .await
                .unwrap();

            // A stale/concurrent writer re-sends IN_PROGRESS after COMPLETED landed.
            store
                .mark_tool_call_status(conv.id, "fc1", ToolCallStatus::Completed, None)
                .await
                .unwrap();
            let row = store
                .upsert_tool_call(
                    conv.id,
                    "fc1",
                    ToolCallType::Function,
                    None,
                    Some(0),
                    None,
                    ToolCallStatus::InProgress,
                )
                .await
                .unwrap();

            assert!(matches!(row.status, ToolCallStatus::Completed));
            assert_eq!(row.name.as_deref(), Some("get_weather"));
        }

        #[tokio::test]
        async fn approval_policy_defaults_to_never() {
            let store = InMemoryConversationStore::new();
            let policy = store.get_approval_policy("srv1", "delete_forecast").await.unwrap();
            assert!(matches!(policy, ApprovalPolicyKind::Never));
        }

        #[tokio::test]
        async fn set_approval_policy_is_idempotent_upsert() {
            let store = InMemoryConversationStore::new();
            store
                .set_approval_policy("srv1", "get_weather", ApprovalPolicyKind::Always)
                .await
                .unwrap();
            store
                .set_approval_policy("srv1", "get_weather", ApprovalPolicyKind::Never)
                .await
                .unwrap();
            let policies = store.list_approval_policies_for_server("srv1").await.unwrap();
            assert_eq!(policies.len(), 1);
            assert!(matches!(policies[0].1, ApprovalPolicyKind::Never));
        }
    }
}
