//! Postgres adapter for [`ConversationStore`], backed by `deadpool-postgres`.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_postgres::Pool;
use serde_json::Value;
use tokio_postgres::Row;

use crate::error::{PersistenceError, PersistenceResult};
use crate::model::{
    ApprovalPolicyKind, Conversation, ConversationStatus, McpServer, McpServerStatus, McpSyncStatus,
    McpTransportKind, Message, MessageRole, ToolCall, ToolCallStatus, ToolCallType,
};
use crate::store::ConversationStore;

pub struct PostgresConversationStore {
    pool: Pool,
}

impl PostgresConversationStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

fn row_to_conversation(row: &Row) -> PersistenceResult<Conversation> {
    let status: String = row.try_get("status")?;
    Ok(Conversation {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        status: ConversationStatus::from_str(&status)
            .ok_or_else(|| PersistenceError::Serialization(format!("unknown conversation status {status}")))?,
        response_id: row.try_get("response_id")?,
        completion_reason: row.try_get("completion_reason")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_message(row: &Row) -> PersistenceResult<Message> {
    let role: String = row.try_get("role")?;
    Ok(Message {
        id: row.try_get("id")?,
        conversation_id: row.try_get("conversation_id")?,
        role: MessageRole::from_str(&role)
            .ok_or_else(|| PersistenceError::Serialization(format!("unknown message role {role}")))?,
        content: row.try_get("content")?,
        raw_json: row.try_get("raw_json")?,
        output_index: row.try_get("output_index")?,
        item_id: row.try_get("item_id")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_tool_call(row: &Row) -> PersistenceResult<ToolCall> {
    let r#type: String = row.try_get("type")?;
    let status: String = row.try_get("status")?;
    Ok(ToolCall {
        id: row.try_get("id")?,
        conversation_id: row.try_get("conversation_id")?,
        r#type: ToolCallType::from_str(&r#type)
            .ok_or_else(|| PersistenceError::Serialization(format!("unknown tool_call type {r#type}")))?,
        name: row.try_get("name")?,
        item_id: row.try_get("item_id")?,
        arguments_json: row.try_get("arguments_json")?,
        result_json: row.try_get("result_json")?,
        status: ToolCallStatus::from_str(&status)
            .ok_or_else(|| PersistenceError::Serialization(format!("unknown tool_call status {status}")))?,
        output_index: row.try_get("output_index")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_mcp_server(row: &Row) -> PersistenceResult<McpServer> {
    let transport: String = row.try_get("transport")?;
    let status: String = row.try_get("status")?;
    let sync_status: String = row.try_get("sync_status")?;
    Ok(McpServer {
        id: row.try_get("id")?,
        server_id: row.try_get("server_id")?,
        name: row.try_get("name")?,
        base_url: row.try_get("base_url")?,
        api_key_enc: row.try_get("api_key_enc")?,
        transport: McpTransportKind::from_str(&transport)
            .ok_or_else(|| PersistenceError::Serialization(format!("unknown transport {transport}")))?,
        status: McpServerStatus::from_str(&status)
            .ok_or_else(|| PersistenceError::Serialization(format!("unknown server status {status}")))?,
        sync_status: McpSyncStatus::from_str(&sync_status)
            .ok_or_else(|| PersistenceError::Serialization(format!("unknown sync status {sync_status}")))?,
        tools_cache: row.try_get("tools_cache")?,
        resources_cache: row.try_get("resources_cache")?,
        prompts_cache: row.try_get("prompts_cache")?,
        last_synced_at: row.try_get("last_synced_at")?,
        version: row.try_get("version")?,
        last_updated: row.try_get("last_updated")?,
    })
}

/// `status_rank` mirrors [`crate::store::ConversationStore`]'s documented
/// monotonic-status invariant, expressed in SQL so the comparison happens
/// inside the same statement as the write.
const TOOL_CALL_STATUS_RANK_SQL: &str = "CASE status WHEN 'IN_PROGRESS' THEN 0 ELSE 1 END";

#[async_trait]
impl ConversationStore for PostgresConversationStore {
    async fn create_conversation(&self, title: Option<String>) -> PersistenceResult<Conversation> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                "INSERT INTO conversations (title, status) VALUES ($1, 'CREATED')
                 RETURNING id, title, status, response_id, completion_reason, created_at, updated_at",
                &[&title],
            )
            .await?;
        row_to_conversation(&row)
    }

    async fn get_conversation(&self, id: i64) -> PersistenceResult<Conversation> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT id, title, status, response_id, completion_reason, created_at, updated_at
                 FROM conversations WHERE id = $1",
                &[&id],
            )
            .await?
            .ok_or_else(|| PersistenceError::NotFound(format!("conversation {id}")))?;
        row_to_conversation(&row)
    }

    async fn update_conversation_status(
        &self,
        id: i64,
        status: ConversationStatus,
        completion_reason: Option<String>,
    ) -> PersistenceResult<()> {
        let client = self.pool.get().await?;
        let n = client
            .execute(
                "UPDATE conversations SET status = $2, completion_reason = $3, updated_at = now()
                 WHERE id = $1",
                &[&id, &status.as_str(), &completion_reason],
            )
            .await?;
        if n == 0 {
            return Err(PersistenceError::NotFound(format!("conversation {id}")));
        }
        Ok(())
    }

    async fn set_conversation_response_id(&self, id: i64, response_id: String) -> PersistenceResult<()> {
        let client = self.pool.get().await?;
        let n = client
            .execute(
                "UPDATE conversations SET response_id = $2, updated_at = now() WHERE id = $1",
                &[&id, &response_id],
            )
            .await?;
        if n == 0 {
            return Err(PersistenceError::NotFound(format!("conversation {id}")));
        }
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
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                "INSERT INTO messages (conversation_id, item_id, role, content, output_index)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (conversation_id, item_id) WHERE item_id IS NOT NULL
                 DO UPDATE SET content = messages.content || EXCLUDED.content
                 RETURNING id, conversation_id, role, content, raw_json, output_index, item_id, created_at",
                &[&conversation_id, &item_id, &role.as_str(), &content, &output_index],
            )
            .await?;
        row_to_message(&row)
    }

    async fn finalize_message_content(
        &self,
        conversation_id: i64,
        item_id: &str,
        content: String,
        raw_json: Option<Value>,
    ) -> PersistenceResult<Message> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "UPDATE messages SET content = $3, raw_json = $4
                 WHERE conversation_id = $1 AND item_id = $2
                 RETURNING id, conversation_id, role, content, raw_json, output_index, item_id, created_at",
                &[&conversation_id, &item_id, &content, &raw_json],
            )
            .await?
            .ok_or_else(|| PersistenceError::NotFound(format!("message {item_id}")))?;
        row_to_message(&row)
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
        let op = || async {
            let client = self
                .pool
                .get()
                .await
                .map_err(|e| backoff::Error::transient(PersistenceError::from(e)))?;

            let query = format!(
                "INSERT INTO tool_calls (conversation_id, item_id, type, name, output_index, arguments_json, status)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)
                 ON CONFLICT (conversation_id, item_id) DO UPDATE SET
                   name = COALESCE(tool_calls.name, EXCLUDED.name),
                   arguments_json = COALESCE(EXCLUDED.arguments_json, tool_calls.arguments_json),
                   status = CASE WHEN {rank_new} >= {rank_old} THEN EXCLUDED.status ELSE tool_calls.status END
                 RETURNING id, conversation_id, type, name, item_id, arguments_json, result_json, status, output_index, created_at, updated_at",
                rank_new = TOOL_CALL_STATUS_RANK_SQL.replace("status", "EXCLUDED.status"),
                rank_old = TOOL_CALL_STATUS_RANK_SQL.replace("status", "tool_calls.status"),
            );

            let row = client
                .query_one(
                    &query,
                    &[
                        &conversation_id,
                        &item_id,
                        &r#type.as_str(),
                        &name,
                        &output_index,
                        &arguments_json,
                        &status.as_str(),
                    ],
                )
                .await
                .map_err(|e| backoff::Error::transient(PersistenceError::from(e)))?;

            row_to_tool_call(&row).map_err(backoff::Error::Permanent)
        };

        backoff::future::retry(retry_policy(), op).await
    }

    async fn mark_tool_call_status(
        &self,
        conversation_id: i64,
        item_id: &str,
        status: ToolCallStatus,
        result_json: Option<Value>,
    ) -> PersistenceResult<ToolCall> {
        let client = self.pool.get().await?;
        let query = format!(
            "UPDATE tool_calls SET
               status = CASE WHEN {rank_new} >= {rank_old} THEN $3 ELSE status END,
               result_json = COALESCE($4, result_json),
               updated_at = now()
             WHERE conversation_id = $1 AND item_id = $2
             RETURNING id, conversation_id, type, name, item_id, arguments_json, result_json, status, output_index, created_at, updated_at",
            rank_new = TOOL_CALL_STATUS_RANK_SQL.replace("status", "$3"),
            rank_old = TOOL_CALL_STATUS_RANK_SQL.replace("status", "tool_calls.status"),
        );
        let row = client
            .query_opt(&query, &[&conversation_id, &item_id, &status.as_str(), &result_json])
            .await?
            .ok_or_else(|| PersistenceError::NotFound(format!("tool_call {item_id}")))?;
        row_to_tool_call(&row)
    }

    async fn create_mcp_server(
        &self,
        server_id: &str,
        name: String,
        base_url: String,
        api_key_enc: Option<Vec<u8>>,
        transport: McpTransportKind,
    ) -> PersistenceResult<McpServer> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                "INSERT INTO mcp_servers (server_id, name, base_url, api_key_enc, transport, status, sync_status)
                 VALUES ($1, $2, $3, $4, $5, 'IDLE', 'NEVER_SYNCED')
                 RETURNING id, server_id, name, base_url, api_key_enc, transport, status, sync_status,
                           tools_cache, resources_cache, prompts_cache, last_synced_at, version, last_updated",
                &[&server_id, &name, &base_url, &api_key_enc, &transport.as_str()],
            )
            .await?;
        row_to_mcp_server(&row)
    }

    async fn get_mcp_server(&self, server_id: &str) -> PersistenceResult<McpServer> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT id, server_id, name, base_url, api_key_enc, transport, status, sync_status,
                        tools_cache, resources_cache, prompts_cache, last_synced_at, version, last_updated
                 FROM mcp_servers WHERE server_id = $1",
                &[&server_id],
            )
            .await?
            .ok_or_else(|| PersistenceError::NotFound(format!("mcp server {server_id}")))?;
        row_to_mcp_server(&row)
    }

    async fn list_mcp_servers(&self) -> PersistenceResult<Vec<McpServer>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                "SELECT id, server_id, name, base_url, api_key_enc, transport, status, sync_status,
                        tools_cache, resources_cache, prompts_cache, last_synced_at, version, last_updated
                 FROM mcp_servers ORDER BY id",
                &[],
            )
            .await?;
        rows.iter().map(row_to_mcp_server).collect()
    }

    async fn delete_mcp_server(&self, server_id: &str) -> PersistenceResult<()> {
        let client = self.pool.get().await?;
        let n = client
            .execute("DELETE FROM mcp_servers WHERE server_id = $1", &[&server_id])
            .await?;
        if n == 0 {
            return Err(PersistenceError::NotFound(format!("mcp server {server_id}")));
        }
        Ok(())
    }

    async fn set_mcp_server_status(&self, server_id: &str, status: McpServerStatus) -> PersistenceResult<()> {
        let client = self.pool.get().await?;
        let n = client
            .execute(
                "UPDATE mcp_servers SET status = $2, last_updated = now() WHERE server_id = $1",
                &[&server_id, &status.as_str()],
            )
            .await?;
        if n == 0 {
            return Err(PersistenceError::NotFound(format!("mcp server {server_id}")));
        }
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
        let op = || async {
            let client = self
                .pool
                .get()
                .await
                .map_err(|e| backoff::Error::transient(PersistenceError::from(e)))?;

            let row = client
                .query_opt(
                    "UPDATE mcp_servers SET
                       tools_cache = $2, resources_cache = $3, prompts_cache = $4,
                       sync_status = $5, version = version + 1,
                       last_synced_at = now(), last_updated = now()
                     WHERE server_id = $1
                     RETURNING id, server_id, name, base_url, api_key_enc, transport, status, sync_status,
                               tools_cache, resources_cache, prompts_cache, last_synced_at, version, last_updated",
                    &[&server_id, &tools_cache, &resources_cache, &prompts_cache, &sync_status.as_str()],
                )
                .await
                .map_err(|e| backoff::Error::transient(PersistenceError::from(e)))?
                .ok_or_else(|| {
                    backoff::Error::Permanent(PersistenceError::NotFound(format!("mcp server {server_id}")))
                })?;

            row_to_mcp_server(&row).map_err(backoff::Error::Permanent)
        };

        backoff::future::retry(retry_policy(), op).await
    }

    async fn get_approval_policy(&self, server_id: &str, tool_name: &str) -> PersistenceResult<ApprovalPolicyKind> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT policy FROM tool_approval_policies WHERE server_id = $1 AND tool_name = $2",
                &[&server_id, &tool_name],
            )
            .await?;
        match row {
            Some(row) => {
                let policy: String = row.try_get("policy")?;
                ApprovalPolicyKind::from_str(&policy)
                    .ok_or_else(|| PersistenceError::Serialization(format!("unknown policy {policy}")))
            }
            None => Ok(ApprovalPolicyKind::Never),
        }
    }

    async fn list_approval_policies_for_server(
        &self,
        server_id: &str,
    ) -> PersistenceResult<Vec<(String, ApprovalPolicyKind)>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                "SELECT tool_name, policy FROM tool_approval_policies WHERE server_id = $1",
                &[&server_id],
            )
            .await?;
        rows.iter()
            .map(|row| {
                let tool_name: String = row.try_get("tool_name")?;
                let policy: String = row.try_get("policy")?;
                let policy = ApprovalPolicyKind::from_str(&policy)
                    .ok_or_else(|| PersistenceError::Serialization(format!("unknown policy {policy}")))?;
                Ok((tool_name, policy))
            })
            .collect()
    }

    async fn set_approval_policy(
        &self,
        server_id: &str,
        tool_name: &str,
        policy: ApprovalPolicyKind,
    ) -> PersistenceResult<()> {
        let client = self.pool.get().await?;
        client
            .execute(
                "INSERT INTO tool_approval_policies (server_id, tool_name, policy)
                 VALUES ($1, $2, $3)
                 ON CONFLICT (server_id, tool_name) DO UPDATE SET policy = EXCLUDED.policy",
                &[&server_id, &tool_name, &policy.as_str()],
            )
            .await?;
        Ok(())
    }

    async fn delete_approval_policies_for_server(&self, server_id: &str) -> PersistenceResult<()> {
        let client = self.pool.get().await?;
        client
            .execute("DELETE FROM tool_approval_policies WHERE server_id = $1", &[&server_id])
            .await?;
        Ok(())
    }
}

fn retry_policy() -> backoff::ExponentialBackoff {
    backoff::ExponentialBackoffBuilder::new()
        .with_initial_interval(Duration::from_millis(10))
        .with_multiplier(2.0)
        .with_max_interval(Duration::from_millis(40))
        .with_max_elapsed_time(Some(Duration::from_millis(70)))
        .build()
}
