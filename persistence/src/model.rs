//! Entity types and enum-as-string mappings for the storage boundary (spec §3, §9).
//!
//! Every domain enum below is persisted as an explicit uppercase string via
//! `as_str`/`from_str`; none derive a numeric discriminant, so adding a
//! variant or reordering one never shifts the meaning of existing rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

macro_rules! string_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }

            pub fn from_str(s: &str) -> Option<Self> {
                match s {
                    $($s => Some(Self::$variant)),+,
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum!(ConversationStatus {
    Created => "CREATED",
    Streaming => "STREAMING",
    Completed => "COMPLETED",
    Incomplete => "INCOMPLETE",
    Failed => "FAILED",
});

string_enum!(MessageRole {
    User => "USER",
    Assistant => "ASSISTANT",
    Tool => "TOOL",
});

string_enum!(ToolCallType {
    Function => "FUNCTION",
    Mcp => "MCP",
});

string_enum!(ToolCallStatus {
    InProgress => "IN_PROGRESS",
    Completed => "COMPLETED",
    Failed => "FAILED",
});

string_enum!(McpTransportKind {
    Sse => "SSE",
    StreamableHttp => "STREAMABLE_HTTP",
});

string_enum!(McpServerStatus {
    Idle => "IDLE",
    Connecting => "CONNECTING",
    Connected => "CONNECTED",
    Error => "ERROR",
});

string_enum!(McpSyncStatus {
    NeverSynced => "NEVER_SYNCED",
    Syncing => "SYNCING",
    Synced => "SYNCED",
    SyncFailed => "SYNC_FAILED",
});

string_enum!(ApprovalPolicyKind {
    Always => "ALWAYS",
    Never => "NEVER",
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub title: Option<String>,
    pub status: ConversationStatus,
    pub response_id: Option<String>,
    pub completion_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub conversation_id: i64,
    pub role: MessageRole,
    pub content: String,
    pub raw_json: Option<Value>,
    pub output_index: Option<i32>,
    pub item_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: i64,
    pub conversation_id: i64,
    pub r#type: ToolCallType,
    pub name: Option<String>,
    pub item_id: String,
    pub arguments_json: Option<Value>,
    pub result_json: Option<Value>,
    pub status: ToolCallStatus,
    pub output_index: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpServer {
    pub id: i64,
    pub server_id: String,
    pub name: String,
    pub base_url: String,
    pub api_key_enc: Option<Vec<u8>>,
    pub transport: McpTransportKind,
    pub status: McpServerStatus,
    pub sync_status: McpSyncStatus,
    pub tools_cache: Value,
    pub resources_cache: Value,
    pub prompts_cache: Value,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub version: i64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolApprovalPolicy {
    pub id: i64,
    pub server_id: String,
    pub tool_name: String,
    pub policy: ApprovalPolicyKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_status_roundtrips() {
        for s in [
            ConversationStatus::Created,
            ConversationStatus::Streaming,
            ConversationStatus::Completed,
            ConversationStatus::Incomplete,
            ConversationStatus::Failed,
        ] {
            assert_eq!(ConversationStatus::from_str(s.as_str()), Some(s));
        }
        assert_eq!(ConversationStatus::from_str("bogus"), None);
    }

    #[test]
    fn approval_policy_kind_default_semantics_is_external() {
        // Absence of a row means NEVER; that default lives in the store, not here.
        assert_eq!(ApprovalPolicyKind::Never.as_str(), "NEVER");
    }
}
