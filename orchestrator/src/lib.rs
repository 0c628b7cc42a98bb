//! Streaming orchestrator: turns an upstream Responses API SSE stream into
//! persisted conversation state and a client-facing SSE stream, executing
//! FUNCTION tool calls and relaying MCP approval requests along the way.
//!
//! ## Modules
//!
//! - [`orchestrator`]: the turn-driving state machine (spec §4.6)
//! - [`sse`]: SSE frame parsing/formatting
//! - [`state`]: per-turn in-memory accumulator state
//! - [`upstream`]: the outbound HTTP client to the upstream Responses API
//! - [`sync`]: the MCP server capability sync job
//! - [`config`]: orchestrator tunables

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod sse;
pub mod state;
pub mod sync;
pub mod upstream;

pub use config::OrchestratorConfig;
pub use error::{OrchestratorError, OrchestratorResult};
pub use orchestrator::{Orchestrator, StreamRequest};
pub use sse::ClientEvent;
pub use sync::ServerSyncJob;
pub use upstream::UpstreamClient;
