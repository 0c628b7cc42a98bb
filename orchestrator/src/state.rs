//! Per-turn in-memory state (spec §4.6): owned by a single task for the
//! duration of one streaming turn, requiring no synchronization.

use std::collections::HashMap;

use conduit_persistence::{ToolCallStatus, ToolCallType};

/// Reconstructs a streamed text/refusal message for one `outputIndex`.
#[derive(Debug, Default, Clone)]
pub struct OutputState {
    pub item_id: Option<String>,
    pub accumulator: String,
    pub finalized: bool,
}

/// Tracks one tool call's lifecycle from `output_item.added` to its terminal event.
#[derive(Debug, Clone)]
pub struct ToolCallState {
    pub r#type: ToolCallType,
    pub name: Option<String>,
    pub output_index: Option<i32>,
    pub args_buffer: String,
    pub status: ToolCallStatus,
}

#[derive(Debug, Default)]
pub struct TurnState {
    pub response_id: Option<String>,
    pub outputs: HashMap<i64, OutputState>,
    pub tool_calls: HashMap<String, ToolCallState>,
    pub completion_reason: Option<String>,
}

impl TurnState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output_mut(&mut self, output_index: i64) -> &mut OutputState {
        self.outputs.entry(output_index).or_default()
    }

    pub fn tool_call_mut(&mut self, item_id: &str, r#type: ToolCallType) -> &mut ToolCallState {
        self.tool_calls.entry(item_id.to_string()).or_insert_with(|| ToolCallState {
            r#type,
            name: None,
            output_index: None,
            args_buffer: String::new(),
            status: ToolCallStatus::InProgress,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_call_mut_creates_on_first_access_and_reuses_after() {
        let mut state = TurnState::new();
        state.tool_call_mut("fc1", ToolCallType::Function).args_buffer.push_str("{\"city\":");
        state.tool_call_mut("fc1", ToolCallType::Mcp).args_buffer.push_str("\"Berlin\"}");
        let call = state.tool_calls.get("fc1").unwrap();
        assert_eq!(call.args_buffer, "{\"city\":\"Berlin\"}");
        assert!(matches!(call.r#type, ToolCallType::Function));
    }
}
