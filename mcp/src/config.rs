//! Types describing how to reach a single MCP server.
//!
//! These are the in-memory counterpart of a persisted `McpServer` row (minus
//! storage-only fields like `version`/capability caches), handed to the
//! session registry whenever it needs to open a connection.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque, operator-assigned identifier for an MCP server. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServerId(String);

impl ServerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ServerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The two transport kinds a server can be reached over (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum McpTransportKind {
    Sse,
    StreamableHttp,
}

impl McpTransportKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sse => "SSE",
            Self::StreamableHttp => "STREAMABLE_HTTP",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "SSE" => Some(Self::Sse),
            "STREAMABLE_HTTP" => Some(Self::StreamableHttp),
            _ => None,
        }
    }
}

/// HTTP(S)_PROXY / NO_PROXY settings applied when opening a transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub http: Option<String>,
    pub https: Option<String>,
    pub no_proxy: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Everything the session registry needs to open a connection to one server.
#[derive(Debug, Clone)]
pub struct ServerConnection {
    pub server_id: ServerId,
    pub name: String,
    pub base_url: String,
    /// Decrypted bearer credential, if the server has one configured.
    pub api_key: Option<String>,
    pub transport: McpTransportKind,
    pub proxy: Option<ProxyConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_kind_roundtrips_through_storage_strings() {
        for kind in [McpTransportKind::Sse, McpTransportKind::StreamableHttp] {
            assert_eq!(McpTransportKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(McpTransportKind::from_str("bogus"), None);
    }
}
