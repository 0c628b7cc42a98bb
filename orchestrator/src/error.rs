//! Orchestrator error taxonomy (spec §7).

use thiserror::Error;

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("approval context missing: {0}")]
    ApprovalContextMissing(String),

    #[error("transport error: {0}")]
    TransportError(String),

    #[error("protocol error: {0}")]
    ProtocolError(String),

    #[error("operation timed out: {0}")]
    Timeout(String),

    #[error("tool error: {0}")]
    ToolError(String),

    #[error("critical upstream error: {0}")]
    CriticalUpstreamError(String),

    #[error(transparent)]
    Persistence(#[from] conduit_persistence::PersistenceError),

    #[error(transparent)]
    Mcp(#[from] conduit_mcp::McpError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl OrchestratorError {
    /// Machine-readable code for the synthesized client-facing `error` event.
    pub fn as_code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::NotFound(_) => "not_found",
            Self::ApprovalContextMissing(_) => "approval_context_missing",
            Self::TransportError(_) | Self::Http(_) => "transport_error",
            Self::ProtocolError(_) => "protocol_error",
            Self::Timeout(_) => "timeout",
            Self::ToolError(_) => "tool_error",
            Self::CriticalUpstreamError(_) => "critical_upstream_error",
            Self::Persistence(e) => match e {
                conduit_persistence::PersistenceError::OptimisticConflict(_) => "optimistic_conflict",
                _ => "persistence_error",
            },
            Self::Mcp(_) => "mcp_error",
        }
    }
}
