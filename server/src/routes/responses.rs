//! `POST /responses/stream`, `POST /responses/approval-response` (spec §6).

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use conduit_orchestrator::StreamRequest;
use serde::Deserialize;
use serde_json::Value;

use crate::error::AppError;
use crate::sse::sse_response;
use crate::state::AppState;

fn auth_header(headers: &HeaderMap, config: &crate::config::AppConfig) -> Result<String, AppError> {
    if let Some(value) = headers.get(axum::http::header::AUTHORIZATION) {
        return Ok(value
            .to_str()
            .map_err(|_| AppError::bad_request("Authorization header is not valid UTF-8"))?
            .to_string());
    }
    config
        .upstream_api_key
        .as_ref()
        .map(|key| format!("Bearer {key}"))
        .ok_or_else(|| AppError::bad_request("missing Authorization header and no upstream_api_key configured"))
}

#[derive(Debug, Deserialize)]
pub struct StreamRequestBody {
    pub conversation_id: Option<i64>,
    pub title: Option<String>,
    pub payload: Value,
}

pub async fn stream(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<StreamRequestBody>,
) -> Result<Response, AppError> {
    if !body.payload.is_object() {
        return Err(AppError::bad_request("payload must be a JSON object"));
    }
    let auth = auth_header(&headers, &state.config)?;

    let request = StreamRequest {
        conversation_id: body.conversation_id,
        title: body.title,
        payload: body.payload,
    };

    let orchestrator: Arc<_> = state.orchestrator.clone();
    let stream = orchestrator.stream_responses(request, auth);
    Ok(sse_response(stream))
}

#[derive(Debug, Deserialize)]
pub struct ApprovalResponseBody {
    pub conversation_id: i64,
    pub approval_request_id: String,
    pub approve: bool,
    pub reason: Option<String>,
}

pub async fn approval_response(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ApprovalResponseBody>,
) -> Result<Response, AppError> {
    let auth = auth_header(&headers, &state.config)?;
    let orchestrator: Arc<_> = state.orchestrator.clone();
    let stream = orchestrator.send_approval_response(
        body.conversation_id,
        body.approval_request_id,
        body.approve,
        body.reason,
        auth,
    );
    Ok(sse_response(stream))
}
