//! Event-name constants for the OpenAI-compatible Responses streaming API.
//!
//! Each family follows the same shape: a small `Copy` enum plus `pub const`
//! string values so callers can either match on the enum or compare a raw
//! `event:` field against a constant without allocating.

use std::fmt;

/// Response lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseEvent {
    Created,
    InProgress,
    Completed,
    Incomplete,
    Failed,
    Error,
}

impl ResponseEvent {
    pub const CREATED: &'static str = "response.created";
    pub const IN_PROGRESS: &'static str = "response.in_progress";
    pub const COMPLETED: &'static str = "response.completed";
    pub const INCOMPLETE: &'static str = "response.incomplete";
    pub const FAILED: &'static str = "response.failed";
    pub const ERROR: &'static str = "response.error";

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => Self::CREATED,
            Self::InProgress => Self::IN_PROGRESS,
            Self::Completed => Self::COMPLETED,
            Self::Incomplete => Self::INCOMPLETE,
            Self::Failed => Self::FAILED,
            Self::Error => Self::ERROR,
        }
    }
}

impl fmt::Display for ResponseEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output item lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputItemEvent {
    Added,
    Done,
}

impl OutputItemEvent {
    pub const ADDED: &'static str = "response.output_item.added";
    pub const DONE: &'static str = "response.output_item.done";

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Added => Self::ADDED,
            Self::Done => Self::DONE,
        }
    }
}

impl fmt::Display for OutputItemEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural content-part framing events. Forwarded as-is; no persistence side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentPartEvent {
    Added,
    Done,
}

impl ContentPartEvent {
    pub const ADDED: &'static str = "response.content_part.added";
    pub const DONE: &'static str = "response.content_part.done";

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Added => Self::ADDED,
            Self::Done => Self::DONE,
        }
    }
}

impl fmt::Display for ContentPartEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assistant text streaming events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputTextEvent {
    Delta,
    Done,
}

impl OutputTextEvent {
    pub const DELTA: &'static str = "response.output_text.delta";
    pub const DONE: &'static str = "response.output_text.done";

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Delta => Self::DELTA,
            Self::Done => Self::DONE,
        }
    }
}

impl fmt::Display for OutputTextEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Refusal streaming events. Same shape as [`OutputTextEvent`]; kept distinct
/// because the accumulated content is semantically a refusal, not an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefusalEvent {
    Delta,
    Done,
}

impl RefusalEvent {
    pub const DELTA: &'static str = "response.refusal.delta";
    pub const DONE: &'static str = "response.refusal.done";

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Delta => Self::DELTA,
            Self::Done => Self::DONE,
        }
    }
}

impl fmt::Display for RefusalEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Function-call argument streaming events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionCallEvent {
    ArgumentsDelta,
    ArgumentsDone,
}

impl FunctionCallEvent {
    pub const ARGUMENTS_DELTA: &'static str = "response.function_call_arguments.delta";
    pub const ARGUMENTS_DONE: &'static str = "response.function_call_arguments.done";

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ArgumentsDelta => Self::ARGUMENTS_DELTA,
            Self::ArgumentsDone => Self::ARGUMENTS_DONE,
        }
    }
}

impl fmt::Display for FunctionCallEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// MCP tool-call lifecycle and argument streaming events.
///
/// Argument delta/done constants are `mcp_call_arguments.*` (underscore-joined),
/// matching the upstream API's own naming convention for function-call argument
/// events (`function_call_arguments.*`). This is the wire-level spelling; the
/// rest of the family uses a `mcp_call.*` (dot-joined) lifecycle suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum McpEvent {
    CallArgumentsDelta,
    CallArgumentsDone,
    CallInProgress,
    CallCompleted,
    CallFailed,
    ListToolsInProgress,
    ListToolsCompleted,
    ApprovalRequest,
}

impl McpEvent {
    pub const CALL_ARGUMENTS_DELTA: &'static str = "response.mcp_call_arguments.delta";
    pub const CALL_ARGUMENTS_DONE: &'static str = "response.mcp_call_arguments.done";
    pub const CALL_IN_PROGRESS: &'static str = "response.mcp_call.in_progress";
    pub const CALL_COMPLETED: &'static str = "response.mcp_call.completed";
    pub const CALL_FAILED: &'static str = "response.mcp_call.failed";
    pub const LIST_TOOLS_IN_PROGRESS: &'static str = "response.mcp_list_tools.in_progress";
    pub const LIST_TOOLS_COMPLETED: &'static str = "response.mcp_list_tools.completed";
    pub const APPROVAL_REQUEST: &'static str = "response.mcp_approval_request";

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CallArgumentsDelta => Self::CALL_ARGUMENTS_DELTA,
            Self::CallArgumentsDone => Self::CALL_ARGUMENTS_DONE,
            Self::CallInProgress => Self::CALL_IN_PROGRESS,
            Self::CallCompleted => Self::CALL_COMPLETED,
            Self::CallFailed => Self::CALL_FAILED,
            Self::ListToolsInProgress => Self::LIST_TOOLS_IN_PROGRESS,
            Self::ListToolsCompleted => Self::LIST_TOOLS_COMPLETED,
            Self::ApprovalRequest => Self::APPROVAL_REQUEST,
        }
    }
}

impl fmt::Display for McpEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output item `type` discriminants, as they appear in `response.output_item.*` payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    Message,
    FunctionCall,
    McpCall,
    McpApprovalRequest,
    McpListTools,
}

impl ItemType {
    pub const MESSAGE: &'static str = "message";
    pub const FUNCTION_CALL: &'static str = "function_call";
    pub const MCP_CALL: &'static str = "mcp_call";
    pub const MCP_APPROVAL_REQUEST: &'static str = "mcp_approval_request";
    pub const MCP_LIST_TOOLS: &'static str = "mcp_list_tools";

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Message => Self::MESSAGE,
            Self::FunctionCall => Self::FUNCTION_CALL,
            Self::McpCall => Self::MCP_CALL,
            Self::McpApprovalRequest => Self::MCP_APPROVAL_REQUEST,
            Self::McpListTools => Self::MCP_LIST_TOOLS,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            Self::MESSAGE => Some(Self::Message),
            Self::FUNCTION_CALL => Some(Self::FunctionCall),
            Self::MCP_CALL => Some(Self::McpCall),
            Self::MCP_APPROVAL_REQUEST => Some(Self::McpApprovalRequest),
            Self::MCP_LIST_TOOLS => Some(Self::McpListTools),
            _ => None,
        }
    }

    pub const fn is_tool_call(&self) -> bool {
        matches!(self, Self::FunctionCall | Self::McpCall | Self::McpApprovalRequest)
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Synthesized events this system emits itself; not part of the upstream wire
/// contract but carried over the same SSE connection to the downstream client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrchestratorEvent {
    ConversationReady,
    ApprovalRequired,
    ConversationStatus,
    Error,
}

impl OrchestratorEvent {
    pub const CONVERSATION_READY: &'static str = "conversation.ready";
    pub const APPROVAL_REQUIRED: &'static str = "approval_required";
    pub const CONVERSATION_STATUS: &'static str = "conversation.status";
    pub const ERROR: &'static str = "error";

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ConversationReady => Self::CONVERSATION_READY,
            Self::ApprovalRequired => Self::APPROVAL_REQUIRED,
            Self::ConversationStatus => Self::CONVERSATION_STATUS,
            Self::Error => Self::ERROR,
        }
    }
}

impl fmt::Display for OrchestratorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn is_response_event(event_type: &str) -> bool {
    event_type.starts_with("response.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_event_roundtrip() {
        assert_eq!(ResponseEvent::Created.as_str(), ResponseEvent::CREATED);
        assert_eq!(ResponseEvent::Created.to_string(), "response.created");
    }

    #[test]
    fn mcp_event_uses_underscore_arguments_suffix() {
        assert_eq!(
            McpEvent::CallArgumentsDelta.as_str(),
            "response.mcp_call_arguments.delta"
        );
        assert_eq!(McpEvent::CallCompleted.as_str(), "response.mcp_call.completed");
    }

    #[test]
    fn item_type_parse_roundtrip() {
        for variant in [
            ItemType::Message,
            ItemType::FunctionCall,
            ItemType::McpCall,
            ItemType::McpApprovalRequest,
            ItemType::McpListTools,
        ] {
            assert_eq!(ItemType::parse(variant.as_str()), Some(variant));
        }
        assert_eq!(ItemType::parse("bogus"), None);
    }

    #[test]
    fn is_response_event_matches_prefix() {
        assert!(is_response_event("response.completed"));
        assert!(!is_response_event("error"));
    }
}
