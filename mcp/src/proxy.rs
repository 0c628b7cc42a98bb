//! HTTP proxy configuration for MCP connections.
//!
//! Resolves proxy settings and applies them to HTTP client builders.

use crate::config::{ProxyConfig, ServerConnection};
use crate::error::{McpError, McpResult};

/// Resolve proxy configuration for a server.
/// Priority: server.proxy > global.proxy > None.
pub(crate) fn resolve_proxy_config<'a>(
    server: &'a ServerConnection,
    global_proxy: Option<&'a ProxyConfig>,
) -> Option<&'a ProxyConfig> {
    server.proxy.as_ref().or(global_proxy)
}

/// Apply proxy configuration to a ClientBuilder.
///
/// Reusable so additional configuration (auth headers, timeouts) can be
/// layered on afterward without rebuilding the proxy settings.
pub(crate) fn apply_proxy_to_builder(
    mut builder: reqwest::ClientBuilder,
    proxy_cfg: &ProxyConfig,
) -> McpResult<reqwest::ClientBuilder> {
    if let Some(ref http_proxy) = proxy_cfg.http {
        let mut proxy = reqwest::Proxy::http(http_proxy)
            .map_err(|e| McpError::Config(format!("invalid HTTP proxy: {e}")))?;
        if let Some(ref no_proxy) = proxy_cfg.no_proxy {
            proxy = proxy.no_proxy(reqwest::NoProxy::from_string(no_proxy));
        }
        if let (Some(ref username), Some(ref password)) = (&proxy_cfg.username, &proxy_cfg.password) {
            proxy = proxy.basic_auth(username, password);
        }
        builder = builder.proxy(proxy);
    }

    if let Some(ref https_proxy) = proxy_cfg.https {
        let mut proxy = reqwest::Proxy::https(https_proxy)
            .map_err(|e| McpError::Config(format!("invalid HTTPS proxy: {e}")))?;
        if let Some(ref no_proxy) = proxy_cfg.no_proxy {
            proxy = proxy.no_proxy(reqwest::NoProxy::from_string(no_proxy));
        }
        if let (Some(ref username), Some(ref password)) = (&proxy_cfg.username, &proxy_cfg.password) {
            proxy = proxy.basic_auth(username, password);
        }
        builder = builder.proxy(proxy);
    }

    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{McpTransportKind, ServerId};

    fn server(proxy: Option<ProxyConfig>) -> ServerConnection {
        ServerConnection {
            server_id: ServerId::new("srv1"),
            name: "srv1".to_string(),
            base_url: "http://localhost:3000/sse".to_string(),
            api_key: None,
            transport: McpTransportKind::Sse,
            proxy,
        }
    }

    #[test]
    fn resolve_proxy_no_config() {
        assert!(resolve_proxy_config(&server(None), None).is_none());
    }

    #[test]
    fn resolve_proxy_global_only() {
        let global = ProxyConfig {
            http: Some("http://global-proxy:8080".to_string()),
            ..Default::default()
        };
        let resolved = resolve_proxy_config(&server(None), Some(&global)).unwrap();
        assert_eq!(resolved.http.as_deref(), Some("http://global-proxy:8080"));
    }

    #[test]
    fn resolve_proxy_server_override() {
        let server_proxy = ProxyConfig {
            http: Some("http://server-proxy:9090".to_string()),
            ..Default::default()
        };
        let global = ProxyConfig {
            http: Some("http://global-proxy:8080".to_string()),
            ..Default::default()
        };
        let resolved = resolve_proxy_config(&server(Some(server_proxy)), Some(&global)).unwrap();
        assert_eq!(resolved.http.as_deref(), Some("http://server-proxy:9090"));
    }

    #[test]
    fn apply_proxy_to_builder_with_http() {
        let proxy = ProxyConfig {
            http: Some("http://proxy.example.com:8080".to_string()),
            no_proxy: Some("localhost,127.0.0.1".to_string()),
            ..Default::default()
        };
        let builder = reqwest::Client::builder();
        let result = apply_proxy_to_builder(builder, &proxy);
        assert!(result.is_ok());
        assert!(result.unwrap().build().is_ok());
    }

    #[test]
    fn apply_proxy_to_builder_invalid_url() {
        let proxy = ProxyConfig {
            http: Some("://invalid".to_string()),
            ..Default::default()
        };
        let builder = reqwest::Client::builder();
        assert!(apply_proxy_to_builder(builder, &proxy).is_err());
    }
}
