//! MCP client: session management, approval policy, and tool surfacing for
//! a streaming orchestrator talking to one or more MCP servers.
//!
//! ## Modules
//!
//! - [`session`]: one logical client per server id, idle eviction, graceful shutdown
//! - [`facade`]: the call surface every other component uses instead of a raw client
//! - [`transport`]: SSE / Streamable HTTP connection setup
//! - [`approval`]: per-tool approval policy and decision audit log
//! - [`tool_provider`]: builds the `tools` array for an outgoing request

pub mod annotations;
pub mod approval;
pub mod config;
pub mod error;
pub mod facade;
pub mod proxy;
pub mod session;
pub mod tool_provider;
pub mod transport;

pub use annotations::{AnnotationType, ToolAnnotations};
pub use approval::{ApprovalPolicyService, AuditEntry, AuditLog, DecisionResult, DecisionSource};
pub use config::{McpTransportKind, ProxyConfig, ServerConnection, ServerId};
pub use error::{McpError, McpResult};
pub use facade::McpClientFacade;
pub use session::{HolderState, SessionRegistry, SessionRegistryConfig};
pub use tool_provider::{ConnectedServer, ToolDefinitionProvider};
