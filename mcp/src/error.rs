//! MCP error types.
//!
//! Covers the session registry, client facade, transports, and approval
//! policy service. Variant names track the failure kinds those components
//! are contracted to surface distinctly rather than a generic catch-all.

use thiserror::Error;

pub type McpResult<T> = Result<T, McpError>;

#[derive(Debug, Error)]
pub enum McpError {
    #[error("server not found: {0}")]
    NotFound(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("MCP handshake failed: {0}")]
    InitError(String),

    #[error("operation timed out: {0}")]
    Timeout(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("not connected: {0}")]
    NotConnected(String),

    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("tool returned an error: {0}")]
    ToolError(String),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Sdk(#[from] Box<rmcp::RmcpError>),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl McpError {
    /// A coarse `(code, message)` pair suitable for the orchestrator's
    /// synthesized client-facing `error` event.
    pub fn as_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Transport(_) | Self::Io(_) | Self::Http(_) => "transport_error",
            Self::InitError(_) => "init_error",
            Self::Timeout(_) => "timeout",
            Self::Protocol(_) | Self::Sdk(_) => "protocol_error",
            Self::NotConnected(_) => "not_connected",
            Self::ToolNotFound(_) => "tool_not_found",
            Self::ToolError(_) => "tool_error",
            Self::InvalidArguments(_) => "invalid_arguments",
            Self::Config(_) => "config_error",
        }
    }
}
