//! `GET/PUT/DELETE /mcp/servers/{id}/tools/{tool}/approval-policy`,
//! `GET /mcp/servers/{id}/tools/approval-policies` (spec §6).

use axum::extract::{Path, State};
use axum::Json;
use conduit_mcp::ServerId;
use conduit_persistence::ApprovalPolicyKind;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PolicyResponse {
    pub tool_name: String,
    pub policy: ApprovalPolicyKind,
}

pub async fn get(
    State(state): State<AppState>,
    Path((server_id, tool_name)): Path<(String, String)>,
) -> Result<Json<PolicyResponse>, AppError> {
    let policy = state
        .policies
        .requires_approval(&ServerId::from(server_id), &tool_name)
        .await?;
    let policy = if policy { ApprovalPolicyKind::Always } else { ApprovalPolicyKind::Never };
    Ok(Json(PolicyResponse { tool_name, policy }))
}

#[derive(Debug, Deserialize)]
pub struct SetPolicyBody {
    pub policy: ApprovalPolicyKind,
}

pub async fn put(
    State(state): State<AppState>,
    Path((server_id, tool_name)): Path<(String, String)>,
    Json(body): Json<SetPolicyBody>,
) -> Result<(), AppError> {
    state
        .policies
        .set_policy(&ServerId::from(server_id), &tool_name, body.policy)
        .await?;
    Ok(())
}

pub async fn delete(
    State(state): State<AppState>,
    Path((server_id, tool_name)): Path<(String, String)>,
) -> Result<(), AppError> {
    state
        .policies
        .set_policy(&ServerId::from(server_id), &tool_name, ApprovalPolicyKind::Never)
        .await?;
    Ok(())
}

pub async fn list_for_server(
    State(state): State<AppState>,
    Path(server_id): Path<String>,
) -> Result<Json<Vec<PolicyResponse>>, AppError> {
    let policies = state
        .policies
        .list_policies(&ServerId::from(server_id))
        .await?
        .into_iter()
        .map(|(tool_name, policy)| PolicyResponse { tool_name, policy })
        .collect();
    Ok(Json(policies))
}
