//! The streaming orchestrator (spec §4.6): runs one conversational turn end
//! to end, mapping upstream Responses API SSE events to client-visible SSE
//! events, persistence writes, and tool-execution/approval round trips.

use std::sync::Arc;

use conduit_mcp::{ConnectedServer, McpClientFacade, ServerConnection, ServerId, ToolDefinitionProvider};
use conduit_persistence::{ConversationStatus, ConversationStore, MessageRole, ToolCallStatus, ToolCallType};
use conduit_secrets::SecretDecryptor;
use openai_protocol::event_types::{
    ContentPartEvent, FunctionCallEvent, ItemType, McpEvent, OrchestratorEvent, OutputItemEvent, OutputTextEvent,
    RefusalEvent, ResponseEvent,
};
use openai_protocol::responses::{ResponseInput, ResponsesRequest};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

use crate::config::OrchestratorConfig;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::sse::{ClientEvent, UpstreamEventReader};
use crate::state::TurnState;
use crate::upstream::UpstreamClient;

/// Bounds the function-call → follow-up-request loop within one client-visible
/// turn (spec.md doesn't name a cap; mirrors the teacher's tool-loop guard).
const MAX_TOOL_ITERATIONS: usize = 10;
const SSE_CHANNEL_SIZE: usize = 64;

pub struct StreamRequest {
    pub conversation_id: Option<i64>,
    pub title: Option<String>,
    pub payload: Value,
}

enum Terminal {
    Completed,
    Incomplete(Option<String>),
    Failed(String),
    Critical(String),
}

pub struct Orchestrator {
    store: Arc<dyn ConversationStore>,
    facade: Arc<McpClientFacade>,
    tool_provider: Arc<ToolDefinitionProvider>,
    secret_decryptor: Arc<dyn SecretDecryptor>,
    upstream: Arc<UpstreamClient>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        facade: Arc<McpClientFacade>,
        tool_provider: Arc<ToolDefinitionProvider>,
        secret_decryptor: Arc<dyn SecretDecryptor>,
        upstream: Arc<UpstreamClient>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            store,
            facade,
            tool_provider,
            secret_decryptor,
            upstream,
            config,
        }
    }

    pub fn stream_responses(self: Arc<Self>, request: StreamRequest, auth_header: String) -> ReceiverStream<ClientEvent> {
        let (tx, rx) = mpsc::channel(SSE_CHANNEL_SIZE);
        tokio::spawn(async move {
            self.run_and_report(move |this, tx| this.run_new_turn(request, auth_header, tx), tx).await;
        });
        ReceiverStream::new(rx)
    }

    pub fn send_approval_response(
        self: Arc<Self>,
        conversation_id: i64,
        approval_request_id: String,
        approve: bool,
        reason: Option<String>,
        auth_header: String,
    ) -> ReceiverStream<ClientEvent> {
        let (tx, rx) = mpsc::channel(SSE_CHANNEL_SIZE);
        tokio::spawn(async move {
            self.run_and_report(
                move |this, tx| this.run_approval_turn(conversation_id, approval_request_id, approve, reason, auth_header, tx),
                tx,
            )
            .await;
        });
        ReceiverStream::new(rx)
    }

    async fn run_and_report<F, Fut>(self: Arc<Self>, f: F, tx: mpsc::Sender<ClientEvent>)
    where
        F: FnOnce(Arc<Self>, mpsc::Sender<ClientEvent>) -> Fut,
        Fut: std::future::Future<Output = OrchestratorResult<()>>,
    {
        let tx_for_err = tx.clone();
        if let Err(e) = f(self, tx).await {
            warn!(error = %e, "streaming turn ended in error");
            let _ = tx_for_err
                .send(ClientEvent::new(OrchestratorEvent::ERROR, json!({"code": e.as_code(), "message": e.to_string()})))
                .await;
        }
    }

    async fn run_approval_turn(
        self: Arc<Self>,
        conversation_id: i64,
        approval_request_id: String,
        approve: bool,
        reason: Option<String>,
        auth_header: String,
        tx: mpsc::Sender<ClientEvent>,
    ) -> OrchestratorResult<()> {
        let conversation = self.store.get_conversation(conversation_id).await?;
        let response_id = conversation.response_id.clone().ok_or_else(|| {
            OrchestratorError::ApprovalContextMissing(format!(
                "conversation {conversation_id} has no responseId"
            ))
        })?;

        let input_item = json!({
            "type": "mcp_approval_response",
            "approval_request_id": approval_request_id,
            "approve": approve,
            "reason": reason,
        });

        let request = ResponsesRequest {
            model: self.config.default_model.clone(),
            input: ResponseInput::Items(vec![input_item]),
            stream: true,
            previous_response_id: Some(response_id),
            tools: None,
            max_tool_calls: None,
            store: Some(true),
            extra: serde_json::Map::new(),
        };

        self.drive_turns(conversation_id, request, auth_header, &tx).await
    }

    async fn run_new_turn(
        self: Arc<Self>,
        request: StreamRequest,
        auth_header: String,
        tx: mpsc::Sender<ClientEvent>,
    ) -> OrchestratorResult<()> {
        let payload = request
            .payload
            .as_object()
            .ok_or_else(|| OrchestratorError::InvalidRequest("payload must be an object".to_string()))?
            .clone();

        let conversation = match request.conversation_id {
            Some(id) => self.store.get_conversation(id).await?,
            None => self.store.create_conversation(request.title.clone()).await?,
        };

        tx.send(ClientEvent::new(
            OrchestratorEvent::CONVERSATION_READY,
            json!({
                "id": conversation.id,
                "title": conversation.title,
                "status": conversation.status.as_str(),
                "responseId": conversation.response_id,
            }),
        ))
        .await
        .ok();

        let model = payload
            .get("model")
            .and_then(|v| v.as_str())
            .unwrap_or(&self.config.default_model)
            .to_string();

        let input = if let Some(input) = payload.get("input") {
            serde_json::from_value(input.clone())
                .map_err(|_| OrchestratorError::InvalidRequest("invalid input field".to_string()))?
        } else if let Some(messages) = payload.get("messages") {
            ResponseInput::Items(
                messages
                    .as_array()
                    .cloned()
                    .ok_or_else(|| OrchestratorError::InvalidRequest("messages must be an array".to_string()))?,
            )
        } else {
            return Err(OrchestratorError::InvalidRequest(
                "payload must carry input or messages".to_string(),
            ));
        };

        let tools = self.tool_provider.build_tools(&self.connected_servers().await?).await?;
        let extra: serde_json::Map<String, Value> = payload
            .into_iter()
            .filter(|(k, _)| !matches!(k.as_str(), "model" | "input" | "messages" | "stream" | "tools"))
            .collect();

        let responses_request = ResponsesRequest {
            model,
            input,
            stream: true,
            previous_response_id: None,
            tools: if tools.is_empty() { None } else { Some(tools) },
            max_tool_calls: None,
            store: Some(true),
            extra,
        };

        self.store
            .update_conversation_status(conversation.id, ConversationStatus::Streaming, None)
            .await?;

        self.drive_turns(conversation.id, responses_request, auth_header, &tx).await
    }

    /// Drives the function-call follow-up loop: sends `request`, consumes its
    /// SSE stream, and if it ends with unresolved function calls, executes
    /// them and issues a follow-up request carrying their results.
    async fn drive_turns(
        &self,
        conversation_id: i64,
        mut request: ResponsesRequest,
        auth_header: String,
        tx: &mpsc::Sender<ClientEvent>,
    ) -> OrchestratorResult<()> {
        for _ in 0..MAX_TOOL_ITERATIONS {
            let response = self.upstream.stream(&request, &auth_header).await?;
            let mut reader = UpstreamEventReader::new(response);
            let mut state = TurnState::new();

            let terminal = self.consume_stream(conversation_id, &mut reader, &mut state, tx).await?;

            match terminal {
                Terminal::Completed => {
                    let pending = pending_function_calls(&state);
                    if pending.is_empty() {
                        self.finalize(conversation_id, ConversationStatus::Completed, None, tx).await?;
                        return Ok(());
                    }

                    let mut follow_up_items = Vec::new();
                    for (item_id, name, arguments) in pending {
                        let output = self.execute_function_call(conversation_id, &item_id, &name, arguments).await;
                        follow_up_items.push(json!({
                            "type": "tool_result",
                            "item_id": item_id,
                            "output": output,
                        }));
                    }

                    request = ResponsesRequest {
                        model: request.model,
                        input: ResponseInput::Items(follow_up_items),
                        stream: true,
                        previous_response_id: state.response_id,
                        tools: None,
                        max_tool_calls: None,
                        store: Some(true),
                        extra: serde_json::Map::new(),
                    };
                }
                Terminal::Incomplete(reason) => {
                    self.finalize(conversation_id, ConversationStatus::Incomplete, reason, tx).await?;
                    return Ok(());
                }
                Terminal::Failed(reason) => {
                    self.finalize(conversation_id, ConversationStatus::Failed, Some(reason), tx).await?;
                    return Ok(());
                }
                Terminal::Critical(reason) => {
                    self.finalize(
                        conversation_id,
                        ConversationStatus::Failed,
                        Some(format!("CRITICAL: {reason}")),
                        tx,
                    )
                    .await?;
                    return Ok(());
                }
            }
        }

        self.finalize(
            conversation_id,
            ConversationStatus::Failed,
            Some("max_tool_iterations_exceeded".to_string()),
            tx,
        )
        .await?;
        Ok(())
    }

    async fn finalize(
        &self,
        conversation_id: i64,
        status: ConversationStatus,
        completion_reason: Option<String>,
        tx: &mpsc::Sender<ClientEvent>,
    ) -> OrchestratorResult<()> {
        self.store
            .update_conversation_status(conversation_id, status, completion_reason.clone())
            .await?;
        tx.send(ClientEvent::new(
            OrchestratorEvent::CONVERSATION_STATUS,
            json!({"status": status.as_str(), "completionReason": completion_reason}),
        ))
        .await
        .ok();
        Ok(())
    }

    async fn consume_stream(
        &self,
        conversation_id: i64,
        reader: &mut UpstreamEventReader,
        state: &mut TurnState,
        tx: &mpsc::Sender<ClientEvent>,
    ) -> OrchestratorResult<Terminal> {
        while let Some((event_type, data)) = reader.next_event().await? {
            if let Some(terminal) = self.handle_event(conversation_id, &event_type, &data, state, tx).await? {
                return Ok(terminal);
            }
        }
        Ok(Terminal::Failed("stream_interrupted".to_string()))
    }

    #[allow(clippy::too_many_lines)]
    async fn handle_event(
        &self,
        conversation_id: i64,
        event_type: &str,
        data: &Value,
        state: &mut TurnState,
        tx: &mpsc::Sender<ClientEvent>,
    ) -> OrchestratorResult<Option<Terminal>> {
        tx.send(ClientEvent::new(event_type, data.clone())).await.ok();

        match event_type {
            ResponseEvent::CREATED => {
                if let Some(id) = data.pointer("/response/id").and_then(|v| v.as_str()) {
                    state.response_id = Some(id.to_string());
                    self.store.set_conversation_response_id(conversation_id, id.to_string()).await?;
                }
            }
            ResponseEvent::IN_PROGRESS => {}
            OutputItemEvent::ADDED => {
                self.handle_output_item_added(conversation_id, data, state).await?;
            }
            OutputTextEvent::DELTA | RefusalEvent::DELTA => {
                let delta = data.get("delta").and_then(|v| v.as_str()).unwrap_or_default();
                let output_index = data.get("output_index").and_then(|v| v.as_i64()).unwrap_or(0);
                state.output_mut(output_index).accumulator.push_str(delta);
                self.store
                    .upsert_message(conversation_id, None, MessageRole::Assistant, Some(output_index as i32), delta)
                    .await?;
            }
            OutputTextEvent::DONE | RefusalEvent::DONE => {
                let output_index = data.get("output_index").and_then(|v| v.as_i64()).unwrap_or(0);
                let item_id = data.get("item_id").and_then(|v| v.as_str()).map(str::to_string);
                let text = data
                    .get("text")
                    .or_else(|| data.get("refusal"))
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| state.output_mut(output_index).accumulator.clone());

                if let Some(output) = state.outputs.get_mut(&output_index) {
                    output.finalized = true;
                    output.item_id = item_id.clone();
                }
                if let Some(item_id) = item_id {
                    self.store.finalize_message_content(conversation_id, &item_id, text, Some(data.clone())).await?;
                }
            }
            ContentPartEvent::ADDED | ContentPartEvent::DONE => {}
            FunctionCallEvent::ARGUMENTS_DELTA | McpEvent::CALL_ARGUMENTS_DELTA => {
                self.append_tool_call_delta(conversation_id, data, state, ToolCallType::Function).await?;
            }
            FunctionCallEvent::ARGUMENTS_DONE | McpEvent::CALL_ARGUMENTS_DONE => {
                self.finalize_tool_call_arguments(conversation_id, data, state).await?;
            }
            McpEvent::CALL_IN_PROGRESS => {
                self.ensure_tool_call_in_progress(conversation_id, data, state).await?;
            }
            McpEvent::CALL_COMPLETED => {
                self.mark_tool_call(conversation_id, data, state, ToolCallStatus::Completed, data.get("output").cloned())
                    .await?;
            }
            McpEvent::CALL_FAILED => {
                self.mark_tool_call(
                    conversation_id,
                    data,
                    state,
                    ToolCallStatus::Failed,
                    data.get("error").cloned(),
                )
                .await?;
            }
            McpEvent::LIST_TOOLS_COMPLETED => {}
            McpEvent::APPROVAL_REQUEST => {
                let item_id = data.get("id").and_then(|v| v.as_str()).unwrap_or_default().to_string();
                let server_label = data.get("server_label").and_then(|v| v.as_str()).unwrap_or_default();
                let name = data.get("name").and_then(|v| v.as_str()).unwrap_or_default();
                let arguments = data.get("arguments").cloned().unwrap_or(Value::Null);

                self.store
                    .upsert_tool_call(
                        conversation_id,
                        &item_id,
                        ToolCallType::Mcp,
                        Some(name.to_string()),
                        None,
                        Some(arguments.clone()),
                        ToolCallStatus::InProgress,
                    )
                    .await?;

                tx.send(ClientEvent::new(
                    OrchestratorEvent::APPROVAL_REQUIRED,
                    json!({
                        "approval_request_id": item_id,
                        "server_label": server_label,
                        "tool_name": name,
                        "arguments": arguments,
                    }),
                ))
                .await
                .ok();
            }
            OutputItemEvent::DONE => {
                self.handle_output_item_done(conversation_id, data).await?;
            }
            ResponseEvent::COMPLETED => return Ok(Some(Terminal::Completed)),
            ResponseEvent::INCOMPLETE => {
                let reason = data
                    .pointer("/response/status_details/reason")
                    .and_then(|v| v.as_str())
                    .map(str::to_string);
                return Ok(Some(Terminal::Incomplete(reason)));
            }
            ResponseEvent::FAILED => {
                let code = data.pointer("/response/error/code").and_then(|v| v.as_str()).unwrap_or("unknown");
                let message = data.pointer("/response/error/message").and_then(|v| v.as_str()).unwrap_or("");
                return Ok(Some(Terminal::Failed(format!("{code}: {message}"))));
            }
            ResponseEvent::ERROR => {}
            OrchestratorEvent::ERROR => {
                let code = data.get("code").and_then(|v| v.as_str()).unwrap_or("unknown");
                return Ok(Some(Terminal::Critical(code.to_string())));
            }
            _ => {}
        }

        Ok(None)
    }

    async fn handle_output_item_added(&self, conversation_id: i64, data: &Value, state: &mut TurnState) -> OrchestratorResult<()> {
        let Some(item) = data.get("item") else { return Ok(()) };
        let output_index = data.get("output_index").and_then(|v| v.as_i64()).unwrap_or(0);
        let item_type = ItemType::parse(item.get("type").and_then(|v| v.as_str()).unwrap_or_default());
        let item_id = item.get("id").and_then(|v| v.as_str()).unwrap_or_default().to_string();

        match item_type {
            Some(ItemType::Message) => {
                let output = state.output_mut(output_index);
                output.item_id = Some(item_id.clone());
                self.store
                    .upsert_message(conversation_id, Some(&item_id), MessageRole::Assistant, Some(output_index as i32), "")
                    .await?;
            }
            Some(ItemType::FunctionCall | ItemType::McpCall | ItemType::McpApprovalRequest) => {
                let r#type = if item_type == Some(ItemType::FunctionCall) { ToolCallType::Function } else { ToolCallType::Mcp };
                let name = item.get("name").and_then(|v| v.as_str()).map(str::to_string);
                state.tool_call_mut(&item_id, r#type).output_index = Some(output_index as i32);
                if let Some(ref n) = name {
                    state.tool_call_mut(&item_id, r#type).name = Some(n.clone());
                }
                self.store
                    .upsert_tool_call(conversation_id, &item_id, r#type, name, Some(output_index as i32), None, ToolCallStatus::InProgress)
                    .await?;
            }
            _ => {}
        }
        Ok(())
    }

    async fn handle_output_item_done(&self, conversation_id: i64, data: &Value) -> OrchestratorResult<()> {
        let Some(item) = data.get("item") else { return Ok(()) };
        let item_id = item.get("id").and_then(|v| v.as_str()).unwrap_or_default();
        let item_type = ItemType::parse(item.get("type").and_then(|v| v.as_str()).unwrap_or_default());

        match item_type {
            Some(ItemType::Message) => {
                if let Some(content) = item.get("content") {
                    let text = content
                        .as_array()
                        .and_then(|blocks| blocks.first())
                        .and_then(|b| b.get("text"))
                        .and_then(|v| v.as_str())
                        .unwrap_or_default();
                    self.store.finalize_message_content(conversation_id, item_id, text.to_string(), Some(item.clone())).await?;
                }
            }
            Some(ItemType::FunctionCall | ItemType::McpCall) => {
                let arguments = item.get("arguments").and_then(|v| v.as_str()).and_then(|s| serde_json::from_str(s).ok());
                let r#type = if item_type == Some(ItemType::FunctionCall) { ToolCallType::Function } else { ToolCallType::Mcp };
                self.store
                    .upsert_tool_call(conversation_id, item_id, r#type, None, None, arguments, ToolCallStatus::InProgress)
                    .await?;
            }
            _ => {}
        }
        Ok(())
    }

    async fn append_tool_call_delta(
        &self,
        conversation_id: i64,
        data: &Value,
        state: &mut TurnState,
        default_type: ToolCallType,
    ) -> OrchestratorResult<()> {
        let item_id = data.get("item_id").and_then(|v| v.as_str()).unwrap_or_default().to_string();
        let delta = data.get("delta").and_then(|v| v.as_str()).unwrap_or_default();

        let call = state.tool_call_mut(&item_id, default_type);
        call.args_buffer.push_str(delta);
        let partial = call.args_buffer.clone();

        self.store
            .upsert_tool_call(
                conversation_id,
                &item_id,
                default_type,
                None,
                None,
                Some(Value::String(partial)),
                ToolCallStatus::InProgress,
            )
            .await?;
        Ok(())
    }

    async fn finalize_tool_call_arguments(&self, conversation_id: i64, data: &Value, state: &mut TurnState) -> OrchestratorResult<()> {
        let item_id = data.get("item_id").and_then(|v| v.as_str()).unwrap_or_default().to_string();
        let raw_arguments = data.get("arguments").and_then(|v| v.as_str()).unwrap_or_default();
        let arguments: Value = serde_json::from_str(raw_arguments).unwrap_or_else(|_| Value::String(raw_arguments.to_string()));

        let r#type = state.tool_calls.get(&item_id).map(|c| c.r#type).unwrap_or(ToolCallType::Function);
        if let Some(call) = state.tool_calls.get_mut(&item_id) {
            call.args_buffer = raw_arguments.to_string();
        }

        self.store
            .upsert_tool_call(conversation_id, &item_id, r#type, None, None, Some(arguments), ToolCallStatus::InProgress)
            .await?;
        Ok(())
    }

    async fn ensure_tool_call_in_progress(&self, conversation_id: i64, data: &Value, state: &mut TurnState) -> OrchestratorResult<()> {
        let item_id = data.get("item_id").and_then(|v| v.as_str()).unwrap_or_default().to_string();
        state.tool_call_mut(&item_id, ToolCallType::Mcp);
        self.store
            .upsert_tool_call(conversation_id, &item_id, ToolCallType::Mcp, None, None, None, ToolCallStatus::InProgress)
            .await?;
        Ok(())
    }

    async fn mark_tool_call(
        &self,
        conversation_id: i64,
        data: &Value,
        state: &mut TurnState,
        status: ToolCallStatus,
        result: Option<Value>,
    ) -> OrchestratorResult<()> {
        let item_id = data.get("item_id").and_then(|v| v.as_str()).unwrap_or_default().to_string();
        if let Some(call) = state.tool_calls.get_mut(&item_id) {
            call.status = status;
        }
        self.store.mark_tool_call_status(conversation_id, &item_id, status, result).await?;
        Ok(())
    }

    /// Executes one pending FUNCTION tool call, trying connected servers that
    /// expose a matching tool name sequentially until one succeeds (spec §4.6,
    /// Open Question: function-call routing preserves sequential fallback).
    async fn execute_function_call(&self, conversation_id: i64, item_id: &str, name: &str, arguments: Value) -> String {
        let servers = match self.connected_servers().await {
            Ok(servers) => servers,
            Err(e) => return format!("error: {e}"),
        };

        for server in &servers {
            if !server.tool_names.iter().any(|t| t == name) {
                continue;
            }
            let connection = &server.connection;
            let timeout = self.config.tool_execution_timeout;
            let call = self.facade.call_tool(connection, &connection.server_id, name, arguments.clone());
            match tokio::time::timeout(timeout, call).await {
                Ok(Ok(result)) => {
                    let output = render_result(&result);
                    let _ = self
                        .store
                        .mark_tool_call_status(conversation_id, item_id, ToolCallStatus::Completed, Some(json!({"output": output})))
                        .await;
                    return output;
                }
                Ok(Err(e)) => {
                    info!(server = %connection.server_id, tool = name, error = %e, "tool call attempt failed, trying next candidate");
                }
                Err(_) => {
                    info!(server = %connection.server_id, tool = name, "tool call attempt timed out, trying next candidate");
                }
            }
        }

        let error = format!("no connected MCP server could execute tool '{name}'");
        let _ = self
            .store
            .mark_tool_call_status(conversation_id, item_id, ToolCallStatus::Failed, Some(json!({"error": error})))
            .await;
        error
    }

    /// Rows with status `Connected`, paired with the tool names currently in
    /// their persisted `toolsCache` — the cache is authoritative for tool
    /// injection (spec §3, §4.5 step 1); this never calls out to the server.
    async fn connected_servers(&self) -> OrchestratorResult<Vec<ConnectedServer>> {
        let rows = self.store.list_mcp_servers().await?;
        let mut connections = Vec::new();
        for row in rows {
            if !matches!(row.status, conduit_persistence::McpServerStatus::Connected) {
                continue;
            }
            let api_key = match &row.api_key_enc {
                Some(ciphertext) => Some(
                    String::from_utf8(self.secret_decryptor.decrypt(ciphertext).map_err(|e| {
                        OrchestratorError::TransportError(format!("decrypting credential for '{}': {e}", row.server_id))
                    })?)
                    .map_err(|e| OrchestratorError::TransportError(format!("decrypted credential not UTF-8: {e}")))?,
                ),
                None => None,
            };
            let transport = match row.transport {
                conduit_persistence::McpTransportKind::Sse => conduit_mcp::McpTransportKind::Sse,
                conduit_persistence::McpTransportKind::StreamableHttp => conduit_mcp::McpTransportKind::StreamableHttp,
            };
            let tool_names: Vec<String> = serde_json::from_value::<Vec<rmcp::model::Tool>>(row.tools_cache.clone())
                .unwrap_or_default()
                .into_iter()
                .map(|t| t.name.to_string())
                .collect();
            connections.push(ConnectedServer {
                connection: ServerConnection {
                    server_id: ServerId::from(row.server_id.clone()),
                    name: row.name,
                    base_url: row.base_url,
                    api_key,
                    transport,
                    proxy: None,
                },
                tool_names,
            });
        }
        Ok(connections)
    }
}

fn render_result(result: &rmcp::model::CallToolResult) -> String {
    result
        .content
        .iter()
        .filter_map(|c| c.as_text().map(|t| t.text.clone()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn pending_function_calls(state: &TurnState) -> Vec<(String, String, Value)> {
    state
        .tool_calls
        .iter()
        .filter(|(_, call)| matches!(call.r#type, ToolCallType::Function) && matches!(call.status, ToolCallStatus::InProgress))
        .filter_map(|(item_id, call)| {
            let name = call.name.clone()?;
            let arguments: Value = serde_json::from_str(&call.args_buffer).unwrap_or(Value::Null);
            Some((item_id.clone(), name, arguments))
        })
        .collect()
}

