//! Shared application state, built once in `main` and cloned (cheaply, via
//! `Arc`) into every request handler.

use std::sync::Arc;

use conduit_mcp::{ApprovalPolicyService, McpClientFacade};
use conduit_orchestrator::{Orchestrator, ServerSyncJob};
use conduit_persistence::ConversationStore;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ConversationStore>,
    pub orchestrator: Arc<Orchestrator>,
    pub facade: Arc<McpClientFacade>,
    pub policies: Arc<ApprovalPolicyService>,
    pub sync_job: Arc<ServerSyncJob>,
    pub secret_key: [u8; 32],
    pub config: Arc<AppConfig>,
}
