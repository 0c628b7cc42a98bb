//! Process configuration (spec §6 "Configuration"): CLI flags with env-var
//! fallbacks, matching the teacher's `clap(derive, env)` convention.

use std::time::Duration;

use clap::Parser;
use conduit_mcp::SessionRegistryConfig;
use conduit_orchestrator::OrchestratorConfig;

#[derive(Debug, Parser, Clone)]
#[command(name = "conduit-server", about = "Streaming MCP orchestration gateway")]
pub struct AppConfig {
    /// Address to bind the HTTP listener on.
    #[arg(long, env = "CONDUIT_BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind_addr: String,

    /// Postgres connection string. When unset, an in-memory store is used
    /// (development/test only — state does not survive a restart).
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Base URL of the upstream OpenAI-compatible Responses API, with `/v1` suffix.
    #[arg(long, env = "UPSTREAM_BASE_URL")]
    pub upstream_base_url: String,

    /// Model used when a request doesn't name one.
    #[arg(long, env = "UPSTREAM_DEFAULT_MODEL", default_value = "gpt-4o")]
    pub upstream_default_model: String,

    /// Fallback bearer credential for the upstream call, used only when the
    /// inbound request carries no `Authorization` header of its own.
    #[arg(long, env = "UPSTREAM_API_KEY")]
    pub upstream_api_key: Option<String>,

    #[arg(long, env = "MCP_INITIALIZATION_TIMEOUT_MS", default_value_t = 10_000)]
    pub mcp_initialization_timeout_ms: u64,

    #[arg(long, env = "MCP_OPERATION_TIMEOUT_MS", default_value_t = 15_000)]
    pub mcp_operation_timeout_ms: u64,

    #[arg(long, env = "MCP_IDLE_TIMEOUT_MS", default_value_t = 30 * 60_000)]
    pub mcp_idle_timeout_ms: u64,

    /// How often the background job refreshes every connected server's
    /// cached tools/resources/prompts.
    #[arg(long, env = "MCP_CACHE_TTL_MS", default_value_t = 5 * 60_000)]
    pub mcp_cache_ttl_ms: u64,

    #[arg(long, env = "ORCHESTRATOR_TOOL_EXECUTION_TIMEOUT_MS", default_value_t = 30_000)]
    pub tool_execution_timeout_ms: u64,

    #[arg(long, env = "ORCHESTRATOR_MAX_RETRIES", default_value_t = 3)]
    pub max_retries: u32,

    #[arg(long, env = "ORCHESTRATOR_RETRY_BACKOFF_BASE_MS", default_value_t = 10)]
    pub retry_backoff_base_ms: u64,

    /// 32-byte AES-256-GCM key, hex-encoded (64 hex characters).
    #[arg(long, env = "SECRET_ENCRYPTION_KEY")]
    pub secret_encryption_key: String,

    /// Directory log files are rotated into; stdout logging is always on.
    #[arg(long, env = "CONDUIT_LOG_DIR")]
    pub log_dir: Option<String>,
}

impl AppConfig {
    pub fn session_registry_config(&self) -> SessionRegistryConfig {
        SessionRegistryConfig {
            init_timeout: Duration::from_millis(self.mcp_initialization_timeout_ms),
            operation_timeout: Duration::from_millis(self.mcp_operation_timeout_ms),
            idle_timeout: Duration::from_millis(self.mcp_idle_timeout_ms),
            global_proxy: None,
        }
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            tool_execution_timeout: Duration::from_millis(self.tool_execution_timeout_ms),
            max_retries: self.max_retries,
            retry_backoff_base: Duration::from_millis(self.retry_backoff_base_ms),
            upstream_base_url: self.upstream_base_url.clone(),
            default_model: self.upstream_default_model.clone(),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.mcp_cache_ttl_ms)
    }

    pub fn decode_secret_key(&self) -> anyhow::Result<[u8; 32]> {
        let bytes = hex::decode(&self.secret_encryption_key)?;
        bytes
            .try_into()
            .map_err(|v: Vec<u8>| anyhow::anyhow!("secret_encryption_key must decode to 32 bytes, got {}", v.len()))
    }
}
