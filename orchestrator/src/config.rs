//! Orchestrator-level tunables (spec §5, §6 configuration keys).

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub tool_execution_timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff_base: Duration,
    pub upstream_base_url: String,
    pub default_model: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            tool_execution_timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_backoff_base: Duration::from_millis(10),
            upstream_base_url: String::new(),
            default_model: String::new(),
        }
    }
}
