//! `GET/POST /mcp/servers`, `/verify`, `/sync`, `/capabilities`,
//! `/status/stream` (spec §6).

use std::time::Duration;

use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use conduit_mcp::{McpTransportKind as McpConnTransport, ServerConnection, ServerId};
use conduit_persistence::{McpServer, McpServerStatus, McpTransportKind};
use conduit_secrets::{AesGcmDecryptor, SecretDecryptor};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::AppError;
use crate::state::AppState;

fn to_connection(server: &McpServer, secret_key: &[u8; 32]) -> Result<ServerConnection, AppError> {
    let api_key = match &server.api_key_enc {
        Some(enc) => {
            let plaintext = AesGcmDecryptor::new(secret_key)?.decrypt(enc)?;
            Some(String::from_utf8(plaintext).map_err(|e| AppError::new(
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "secret_error",
                e.to_string(),
            ))?)
        }
        None => None,
    };
    let transport = match server.transport {
        McpTransportKind::Sse => McpConnTransport::Sse,
        McpTransportKind::StreamableHttp => McpConnTransport::StreamableHttp,
    };
    Ok(ServerConnection {
        server_id: ServerId::from(server.server_id.clone()),
        name: server.name.clone(),
        base_url: server.base_url.clone(),
        api_key,
        transport,
        proxy: None,
    })
}

#[derive(Debug, Deserialize)]
pub struct CreateServerBody {
    pub server_id: String,
    pub name: String,
    pub base_url: String,
    pub api_key: Option<String>,
    /// `"SSE"` or `"STREAMABLE_HTTP"`, matching the wire form `McpTransportKind::as_str` produces.
    pub transport: String,
}

/// [`McpServer`] without `api_key_enc` — the encrypted credential never
/// round-trips through the HTTP surface once stored.
#[derive(Debug, Serialize)]
pub struct McpServerView {
    pub id: i64,
    pub server_id: String,
    pub name: String,
    pub base_url: String,
    pub has_api_key: bool,
    pub transport: McpTransportKind,
    pub status: McpServerStatus,
    pub sync_status: conduit_persistence::McpSyncStatus,
    pub version: i64,
    pub last_synced_at: Option<chrono::DateTime<chrono::Utc>>,
    pub last_updated: chrono::DateTime<chrono::Utc>,
}

impl From<McpServer> for McpServerView {
    fn from(s: McpServer) -> Self {
        Self {
            id: s.id,
            server_id: s.server_id,
            name: s.name,
            base_url: s.base_url,
            has_api_key: s.api_key_enc.is_some(),
            transport: s.transport,
            status: s.status,
            sync_status: s.sync_status,
            version: s.version,
            last_synced_at: s.last_synced_at,
            last_updated: s.last_updated,
        }
    }
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<McpServerView>>, AppError> {
    let servers = state.store.list_mcp_servers().await?.into_iter().map(McpServerView::from).collect();
    Ok(Json(servers))
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateServerBody>,
) -> Result<Json<McpServerView>, AppError> {
    let transport = McpTransportKind::from_str(&body.transport)
        .ok_or_else(|| AppError::bad_request(format!("unknown transport '{}'", body.transport)))?;
    let api_key_enc = match body.api_key {
        Some(key) => Some(conduit_secrets::encrypt(&state.secret_key, key.as_bytes())?),
        None => None,
    };
    let server = state
        .store
        .create_mcp_server(&body.server_id, body.name, body.base_url, api_key_enc, transport)
        .await?;
    Ok(Json(server.into()))
}

pub async fn delete(State(state): State<AppState>, Path(server_id): Path<String>) -> Result<(), AppError> {
    state.store.delete_mcp_server(&server_id).await?;
    state.store.delete_approval_policies_for_server(&server_id).await?;
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct VerifyResult {
    pub ok: bool,
    pub message: Option<String>,
}

pub async fn verify(State(state): State<AppState>, Path(server_id): Path<String>) -> Result<Json<VerifyResult>, AppError> {
    let server = state.store.get_mcp_server(&server_id).await?;
    let connection = to_connection(&server, &state.secret_key)?;

    match state.facade.list_tools(&connection).await {
        Ok(_) => {
            state.store.set_mcp_server_status(&server_id, McpServerStatus::Connected).await?;
            Ok(Json(VerifyResult { ok: true, message: None }))
        }
        Err(e) => {
            state.store.set_mcp_server_status(&server_id, McpServerStatus::Error).await?;
            Ok(Json(VerifyResult { ok: false, message: Some(e.to_string()) }))
        }
    }
}

pub async fn sync(State(state): State<AppState>, Path(server_id): Path<String>) -> Result<(), AppError> {
    let server = state.store.get_mcp_server(&server_id).await?;
    let connection = to_connection(&server, &state.secret_key)?;
    state.sync_job.sync(&connection).await.map_err(|e| {
        AppError::new(axum::http::StatusCode::BAD_GATEWAY, e.as_code(), e.to_string())
    })
}

#[derive(Debug, Serialize)]
pub struct CapabilitiesResponse {
    pub tools: Value,
    pub resources: Value,
    pub prompts: Value,
    pub version: i64,
    pub sync_status: conduit_persistence::McpSyncStatus,
    pub last_synced_at: Option<chrono::DateTime<chrono::Utc>>,
}

pub async fn capabilities(
    State(state): State<AppState>,
    Path(server_id): Path<String>,
) -> Result<Json<CapabilitiesResponse>, AppError> {
    let server = state.store.get_mcp_server(&server_id).await?;
    Ok(Json(CapabilitiesResponse {
        tools: server.tools_cache,
        resources: server.resources_cache,
        prompts: server.prompts_cache,
        version: server.version,
        sync_status: server.sync_status,
        last_synced_at: server.last_synced_at,
    }))
}

/// Polls the server row and emits `{status, syncStatus}` whenever either
/// changes, following the same spawn-task-into-channel shape as the
/// orchestrator's own streaming turns (no push-based subscription exists on
/// the persistence port to drive this directly).
pub async fn status_stream(State(state): State<AppState>, Path(server_id): Path<String>) -> Response {
    let store = state.store.clone();
    let (tx, rx) = tokio::sync::mpsc::channel(16);

    tokio::spawn(async move {
        let mut last: Option<(McpServerStatus, conduit_persistence::McpSyncStatus)> = None;
        loop {
            let server = match store.get_mcp_server(&server_id).await {
                Ok(server) => server,
                Err(_) => break,
            };
            let current = (server.status, server.sync_status);
            if last != Some(current) {
                last = Some(current);
                let event = conduit_orchestrator::ClientEvent::new(
                    "mcp_server.status",
                    json!({"status": server.status.as_str(), "syncStatus": server.sync_status.as_str()}),
                );
                if tx.send(event).await.is_err() {
                    break;
                }
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    });

    crate::sse::sse_response(tokio_stream::wrappers::ReceiverStream::new(rx))
}
