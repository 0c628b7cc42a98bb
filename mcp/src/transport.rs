//! Opens an MCP transport (SSE or Streamable HTTP) and performs the MCP handshake.
//!
//! Both variants are expressed as `rmcp` transports fed into `().serve(transport)`;
//! the resulting `RunningService` is transport-agnostic from here on, which is
//! what lets the session registry store one client type regardless of which
//! transport a given server uses.

use std::time::Duration;

use rmcp::{
    transport::{
        sse_client::SseClientConfig,
        streamable_http_client::StreamableHttpClientTransportConfig,
        SseClientTransport, StreamableHttpClientTransport,
    },
    RoleClient, ServiceExt,
};

use crate::config::{McpTransportKind, ServerConnection};
use crate::error::{McpError, McpResult};
use crate::proxy::{apply_proxy_to_builder, resolve_proxy_config};

/// A live MCP client connection. Opaque beyond the `peer()` accessor the
/// facade uses to issue requests.
pub type McpClient = rmcp::service::RunningService<RoleClient, ()>;

/// Open a connection to `server` and complete the MCP initialize handshake,
/// bounded by `init_timeout`.
pub(crate) async fn connect(
    server: &ServerConnection,
    global_proxy: Option<&crate::config::ProxyConfig>,
    init_timeout: Duration,
) -> McpResult<McpClient> {
    tokio::time::timeout(init_timeout, connect_inner(server, global_proxy))
        .await
        .map_err(|_| McpError::InitError(format!("initialize timed out for '{}'", server.server_id)))?
}

async fn connect_inner(
    server: &ServerConnection,
    global_proxy: Option<&crate::config::ProxyConfig>,
) -> McpResult<McpClient> {
    match server.transport {
        McpTransportKind::Sse => {
            let proxy_config = resolve_proxy_config(server, global_proxy);

            let mut builder = reqwest::Client::builder().connect_timeout(Duration::from_secs(10));
            if let Some(proxy_cfg) = proxy_config {
                builder = apply_proxy_to_builder(builder, proxy_cfg)?;
            }
            if let Some(ref key) = server.api_key {
                builder = builder.default_headers({
                    let mut headers = reqwest::header::HeaderMap::new();
                    headers.insert(
                        reqwest::header::AUTHORIZATION,
                        format!("Bearer {key}")
                            .parse()
                            .map_err(|e| McpError::Transport(format!("invalid api key header: {e}")))?,
                    );
                    headers
                });
            }
            let http_client = builder
                .build()
                .map_err(|e| McpError::Transport(format!("build HTTP client: {e}")))?;

            let sse_config = SseClientConfig {
                sse_endpoint: server.base_url.clone().into(),
                ..Default::default()
            };

            let transport = SseClientTransport::start_with_client(http_client, sse_config)
                .await
                .map_err(|e| McpError::Transport(format!("create SSE transport: {e}")))?;

            ().serve(transport)
                .await
                .map_err(|e| McpError::InitError(format!("initialize SSE client: {e}")))
        }

        McpTransportKind::StreamableHttp => {
            let transport = if let Some(ref key) = server.api_key {
                let mut cfg = StreamableHttpClientTransportConfig::with_uri(server.base_url.as_str());
                cfg.auth_header = Some(format!("Bearer {key}"));
                StreamableHttpClientTransport::from_config(cfg)
            } else {
                StreamableHttpClientTransport::from_uri(server.base_url.as_str())
            };

            ().serve(transport)
                .await
                .map_err(|e| McpError::InitError(format!("initialize streamable HTTP client: {e}")))
        }
    }
}
