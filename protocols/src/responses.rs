//! Wire types for the OpenAI-compatible Responses streaming API.
//!
//! These mirror the subset of the `/v1/responses` request/response surface
//! this system talks: request construction (including MCP tool blocks and
//! `previous_response_id` resumption), and the output item shapes that show
//! up in `response.output_item.*` events and in a finalized response's
//! `output` array.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::common::Function;

/// Generate an upstream-style item id: a short type prefix plus a random suffix.
///
/// Matches the convention upstream uses for ids like `msg_...`, `fc_...`, `mcpl_...`.
pub fn generate_id(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::new_v4().simple())
}

/// The `input` field of a Responses request: either a plain string prompt or
/// a list of structured input items (messages, tool results, approval
/// responses, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseInput {
    Text(String),
    Items(Vec<Value>),
}

impl ResponseInput {
    /// Append additional items, converting a bare `Text` input into a single
    /// user-message item first.
    pub fn into_items(self) -> Vec<Value> {
        match self {
            Self::Items(items) => items,
            Self::Text(text) => vec![serde_json::json!({
                "role": "user",
                "content": text,
            })],
        }
    }
}

/// `require_approval` as carried on an MCP tool block: either a single mode
/// applied to every tool in the block, or (upstream-side only) a per-tool map.
/// This system only ever emits the bare string form since tools are already
/// grouped by resolved policy before a block is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequireApproval {
    Always,
    Never,
}

impl RequireApproval {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Never => "never",
        }
    }
}

/// The `type` discriminant of a [`ResponseTool`] entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseToolType {
    Function,
    Mcp,
}

/// A single tool declaration injected into a Responses request's `tools` array.
///
/// For `type = "function"`, only `function` is populated. For `type = "mcp"`,
/// `server_label`/`server_url`/`allowed_tools`/`require_approval` describe an
/// entire MCP server (or policy-grouped subset of one); `function` is unused
/// in that case and left `None`.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseTool {
    #[serde(rename = "type")]
    pub r#type: ResponseToolType,
    pub function: Option<Function>,
    pub server_url: Option<String>,
    pub authorization: Option<String>,
    pub headers: Option<Value>,
    pub server_label: Option<String>,
    pub server_description: Option<String>,
    pub require_approval: Option<RequireApproval>,
    pub allowed_tools: Option<Vec<String>>,
}

/// Request body for `POST {base}/responses`.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponsesRequest {
    pub model: String,
    pub input: ResponseInput,
    pub stream: bool,
    pub previous_response_id: Option<String>,
    pub tools: Option<Vec<ResponseTool>>,
    pub max_tool_calls: Option<u32>,
    pub store: Option<bool>,
    /// Any additional fields the caller's payload carried (temperature, etc.);
    /// forwarded to upstream verbatim alongside the typed fields above.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// A tool's declaration as surfaced by an `mcp_list_tools` output item.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpToolInfo {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Value,
    pub annotations: Option<Value>,
}

/// An entry of a finalized response's `output` array, and the shape carried
/// by `response.output_item.added`/`.done` events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseOutputItem {
    Message {
        id: String,
        #[serde(default)]
        content: Vec<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        role: Option<String>,
    },
    FunctionCall {
        id: String,
        call_id: String,
        name: String,
        #[serde(default)]
        arguments: String,
    },
    McpCall {
        id: String,
        name: String,
        server_label: String,
        #[serde(default)]
        arguments: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        output: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    McpApprovalRequest {
        id: String,
        server_label: String,
        name: String,
        #[serde(default)]
        arguments: String,
    },
    McpListTools {
        id: String,
        server_label: String,
        tools: Vec<McpToolInfo>,
    },
}

impl ResponseOutputItem {
    pub fn item_id(&self) -> &str {
        match self {
            Self::Message { id, .. }
            | Self::FunctionCall { id, .. }
            | Self::McpCall { id, .. }
            | Self::McpApprovalRequest { id, .. }
            | Self::McpListTools { id, .. } => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_id_has_prefix() {
        let id = generate_id("mcpl");
        assert!(id.starts_with("mcpl_"));
    }

    #[test]
    fn text_input_becomes_single_user_item() {
        let items = ResponseInput::Text("hi".to_string()).into_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["role"], "user");
    }

    #[test]
    fn response_tool_omits_unset_fields() {
        let tool = ResponseTool {
            r#type: ResponseToolType::Mcp,
            function: None,
            server_url: Some("https://example".to_string()),
            authorization: None,
            headers: None,
            server_label: Some("srv1".to_string()),
            server_description: None,
            require_approval: Some(RequireApproval::Never),
            allowed_tools: Some(vec!["get_weather".to_string()]),
        };
        let v = serde_json::to_value(&tool).unwrap();
        assert!(v.get("authorization").is_none());
        assert_eq!(v["require_approval"], "never");
    }

    #[test]
    fn output_item_tag_roundtrips() {
        let item = ResponseOutputItem::McpApprovalRequest {
            id: "ap1".to_string(),
            server_label: "srv1".to_string(),
            name: "delete_forecast".to_string(),
            arguments: "{}".to_string(),
        };
        let v = serde_json::to_value(&item).unwrap();
        assert_eq!(v["type"], "mcp_approval_request");
        let back: ResponseOutputItem = serde_json::from_value(v).unwrap();
        assert_eq!(back.item_id(), "ap1");
    }
}
