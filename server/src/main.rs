//! Process entry point: parses configuration, wires the persistence/MCP/
//! orchestrator ports together, and serves the HTTP surface (spec §6).

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use conduit_mcp::{ApprovalPolicyService, McpClientFacade, SessionRegistry, ToolDefinitionProvider};
use conduit_orchestrator::{Orchestrator, ServerSyncJob, UpstreamClient};
use conduit_persistence::{ConversationStore, InMemoryConversationStore, PostgresConversationStore};
use conduit_secrets::{AesGcmDecryptor, SecretDecryptor};
use conduit_server::config::AppConfig;
use conduit_server::routes;
use conduit_server::state::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(log_dir: Option<&str>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = tracing_subscriber::fmt::layer().json();

    match log_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "conduit-server.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let file_layer = tracing_subscriber::fmt::layer().json().with_writer(non_blocking);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(stdout_layer)
                .with(file_layer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(env_filter).with(stdout_layer).init();
            None
        }
    }
}

async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn ConversationStore>> {
    match &config.database_url {
        Some(url) => {
            let mut pg_config = deadpool_postgres::Config::new();
            pg_config.url = Some(url.clone());
            let pool = pg_config.create_pool(Some(deadpool_postgres::Runtime::Tokio1), tokio_postgres::NoTls)?;
            Ok(Arc::new(PostgresConversationStore::new(pool)))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store (state will not survive a restart)");
            Ok(Arc::new(InMemoryConversationStore::new()))
        }
    }
}

/// Refreshes every connected server's cached capabilities on `cache_ttl`,
/// so clients see reasonably fresh `tools_cache`/`resources_cache`/`prompts_cache`
/// without having to call `/sync` themselves.
fn spawn_cache_refresh_job(
    store: Arc<dyn ConversationStore>,
    facade: Arc<McpClientFacade>,
    secret_key: [u8; 32],
    interval: Duration,
) {
    tokio::spawn(async move {
        let decryptor = AesGcmDecryptor::new(&secret_key).expect("32-byte key validated at startup");
        let sync_job = ServerSyncJob::new(store.clone(), facade);
        loop {
            tokio::time::sleep(interval).await;
            let servers = match store.list_mcp_servers().await {
                Ok(servers) => servers,
                Err(e) => {
                    tracing::warn!(error = %e, "cache refresh: failed to list servers");
                    continue;
                }
            };
            for server in servers {
                if !matches!(server.status, conduit_persistence::McpServerStatus::Connected) {
                    continue;
                }
                let api_key = match &server.api_key_enc {
                    Some(enc) => match decryptor.decrypt(enc) {
                        Ok(bytes) => String::from_utf8(bytes).ok(),
                        Err(e) => {
                            tracing::warn!(server_id = %server.server_id, error = %e, "cache refresh: decrypt failed");
                            continue;
                        }
                    },
                    None => None,
                };
                let transport = match server.transport {
                    conduit_persistence::McpTransportKind::Sse => conduit_mcp::McpTransportKind::Sse,
                    conduit_persistence::McpTransportKind::StreamableHttp => conduit_mcp::McpTransportKind::StreamableHttp,
                };
                let connection = conduit_mcp::ServerConnection {
                    server_id: conduit_mcp::ServerId::from(server.server_id.clone()),
                    name: server.name.clone(),
                    base_url: server.base_url.clone(),
                    api_key,
                    transport,
                    proxy: None,
                };
                if let Err(e) = sync_job.sync(&connection).await {
                    tracing::warn!(server_id = %server.server_id, error = %e, "periodic capability sync failed");
                }
            }
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::parse();
    let _log_guard = init_tracing(config.log_dir.as_deref());

    let secret_key = config.decode_secret_key()?;
    let store = build_store(&config).await?;
    let registry = SessionRegistry::new(config.session_registry_config());
    let facade = Arc::new(McpClientFacade::new(registry));
    let policies = Arc::new(ApprovalPolicyService::new(store.clone()));
    let tool_provider = Arc::new(ToolDefinitionProvider::new(policies.clone()));
    let secret_decryptor: Arc<dyn SecretDecryptor> = Arc::new(AesGcmDecryptor::new(&secret_key)?);
    let upstream = Arc::new(UpstreamClient::new(config.upstream_base_url.clone()));

    let orchestrator = Arc::new(Orchestrator::new(
        store.clone(),
        facade.clone(),
        tool_provider,
        secret_decryptor,
        upstream,
        config.orchestrator_config(),
    ));
    let sync_job = Arc::new(ServerSyncJob::new(store.clone(), facade.clone()));

    spawn_cache_refresh_job(store.clone(), facade.clone(), secret_key, config.cache_ttl());

    let state = AppState {
        store,
        orchestrator,
        facade,
        policies,
        sync_job,
        secret_key,
        config: Arc::new(config.clone()),
    };

    let app = routes::build_router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
