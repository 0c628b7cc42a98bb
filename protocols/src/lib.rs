//! OpenAI-compatible Responses API protocol definitions and types.

pub mod common;
pub mod event_types;
pub mod responses;

pub use common::{Function, Tool};
pub use event_types::{
    ContentPartEvent, FunctionCallEvent, ItemType, McpEvent, OrchestratorEvent, OutputItemEvent,
    OutputTextEvent, RefusalEvent, ResponseEvent,
};
pub use responses::{
    generate_id, McpToolInfo, RequireApproval, ResponseInput, ResponseOutputItem, ResponseTool,
    ResponseToolType, ResponsesRequest,
};
