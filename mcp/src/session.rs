//! MCP Session Registry (spec §4.1): one logical async client per `serverId`,
//! at most one initialization in flight per server, idle eviction, graceful
//! shutdown.
//!
//! The registry keys a `DashMap` by `ServerId` to an `Arc<tokio::sync::Mutex<SessionSlot>>`.
//! `entry(...).or_insert_with(...)` makes creation of that inner mutex atomic,
//! and holding the mutex locked across the handshake `.await` is what gives
//! "at most one initialize in flight" without a separate memoized-future
//! structure: every concurrent caller for the same `serverId` blocks on the
//! same lock and the loser of the race simply observes the winner's result.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::{ProxyConfig, ServerConnection, ServerId};
use crate::error::{McpError, McpResult};
use crate::transport::{self, McpClient};

const DEFAULT_INIT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);
const EVICTION_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HolderState {
    Initializing,
    Active,
    Error,
    Closed,
}

enum SessionState {
    Initializing,
    Active(Arc<McpClient>),
    Error,
    Closed,
}

impl SessionState {
    fn holder_state(&self) -> HolderState {
        match self {
            Self::Initializing => HolderState::Initializing,
            Self::Active(_) => HolderState::Active,
            Self::Error => HolderState::Error,
            Self::Closed => HolderState::Closed,
        }
    }
}

struct SessionSlot {
    state: SessionState,
    last_accessed: Instant,
}

impl SessionSlot {
    fn new() -> Self {
        Self {
            state: SessionState::Initializing,
            last_accessed: Instant::now(),
        }
    }
}

pub struct SessionRegistryConfig {
    pub init_timeout: Duration,
    pub operation_timeout: Duration,
    pub idle_timeout: Duration,
    pub global_proxy: Option<ProxyConfig>,
}

impl Default for SessionRegistryConfig {
    fn default() -> Self {
        Self {
            init_timeout: DEFAULT_INIT_TIMEOUT,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            global_proxy: None,
        }
    }
}

/// Owns the in-memory MCP client handles keyed by `serverId`. Only this
/// registry ever constructs a [`McpClient`]; every other component goes
/// through [`SessionRegistry::get_or_create`].
pub struct SessionRegistry {
    sessions: DashMap<ServerId, Arc<Mutex<SessionSlot>>>,
    config: SessionRegistryConfig,
}

impl SessionRegistry {
    pub fn new(config: SessionRegistryConfig) -> Arc<Self> {
        let registry = Arc::new(Self {
            sessions: DashMap::new(),
            config,
        });
        registry.clone().spawn_eviction_loop();
        registry
    }

    pub fn operation_timeout(&self) -> Duration {
        self.config.operation_timeout
    }

    /// Observability hook: current lifecycle state of a server's holder, if any.
    pub fn holder_state(&self, server_id: &ServerId) -> Option<HolderState> {
        let slot = self.sessions.get(server_id)?.clone();
        // try_lock: this is diagnostics-only, never block a status query on an
        // in-flight handshake.
        slot.try_lock().ok().map(|g| g.state.holder_state())
    }

    /// Returns the client for `server.server_id`, initializing a session if
    /// none is active yet. Concurrent callers for the same server share the
    /// single initialization attempt.
    pub async fn get_or_create(&self, server: &ServerConnection) -> McpResult<Arc<McpClient>> {
        let slot = self
            .sessions
            .entry(server.server_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(SessionSlot::new())))
            .clone();

        let mut guard = slot.lock().await;
        guard.last_accessed = Instant::now();

        if let SessionState::Active(client) = &guard.state {
            return Ok(client.clone());
        }

        guard.state = SessionState::Initializing;
        match transport::connect(server, self.config.global_proxy.as_ref(), self.config.init_timeout).await {
            Ok(client) => {
                let client = Arc::new(client);
                guard.state = SessionState::Active(client.clone());
                guard.last_accessed = Instant::now();
                info!(server_id = %server.server_id, "MCP session initialized");
                Ok(client)
            }
            Err(err) => {
                guard.state = SessionState::Error;
                drop(guard);
                // A failed initialization never poisons future attempts.
                self.sessions.remove(&server.server_id);
                Err(err)
            }
        }
    }

    /// Close a single session if one exists, swallowing transport-close errors.
    pub async fn close_session(&self, server_id: &ServerId) {
        let Some((_, slot)) = self.sessions.remove(server_id) else {
            return;
        };
        let mut guard = slot.lock().await;
        if let SessionState::Active(client) = std::mem::replace(&mut guard.state, SessionState::Closed) {
            match Arc::try_unwrap(client) {
                Ok(client) => {
                    if let Err(err) = client.cancel().await {
                        warn!(server_id = %server_id, error = %err, "error closing MCP session");
                    }
                }
                Err(_still_in_use) => {
                    warn!(server_id = %server_id, "session closed while a call was still in flight");
                }
            }
        }
    }

    /// Close every session. Used on shutdown; never fails.
    pub async fn close_all(&self) {
        let ids: Vec<ServerId> = self.sessions.iter().map(|e| e.key().clone()).collect();
        for id in ids {
            self.close_session(&id).await;
        }
    }

    fn spawn_eviction_loop(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(EVICTION_INTERVAL);
            loop {
                interval.tick().await;
                self.evict_idle().await;
            }
        });
    }

    async fn evict_idle(&self) {
        let idle_ids: Vec<ServerId> = self
            .sessions
            .iter()
            .filter_map(|entry| {
                let slot = entry.value().clone();
                match slot.try_lock() {
                    Ok(guard) => {
                        let is_idle = matches!(guard.state, SessionState::Active(_))
                            && guard.last_accessed.elapsed() > self.config.idle_timeout;
                        is_idle.then(|| entry.key().clone())
                    }
                    Err(_) => None,
                }
            })
            .collect();

        for id in idle_ids {
            info!(server_id = %id, "evicting idle MCP session");
            self.close_session(&id).await;
        }
    }
}

/// Convenience error helper for callers that need a `NotFound` without going
/// through the registry (e.g. a server row that doesn't exist at all).
pub fn server_not_found(server_id: &ServerId) -> McpError {
    McpError::NotFound(server_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::McpTransportKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn conn(id: &str) -> ServerConnection {
        ServerConnection {
            server_id: ServerId::new(id),
            name: id.to_string(),
            base_url: "http://127.0.0.1:1/sse".to_string(),
            api_key: None,
            transport: McpTransportKind::Sse,
            proxy: None,
        }
    }

    #[tokio::test]
    async fn holder_state_is_none_before_first_access() {
        let registry = SessionRegistry::new(SessionRegistryConfig::default());
        assert!(registry.holder_state(&ServerId::new("srv1")).is_none());
    }

    #[tokio::test]
    async fn failed_initialization_is_not_poisoned_for_next_attempt() {
        let registry = SessionRegistry::new(SessionRegistryConfig {
            init_timeout: Duration::from_millis(50),
            ..Default::default()
        });
        let c = conn("srv1");
        let first = registry.get_or_create(&c).await;
        assert!(first.is_err());
        // The holder was removed, not left in an Error state forever.
        assert!(registry.holder_state(&c.server_id).is_none());
        let second = registry.get_or_create(&c).await;
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn close_all_on_empty_registry_does_not_panic() {
        let registry = SessionRegistry::new(SessionRegistryConfig::default());
        registry.close_all().await;
    }

    #[tokio::test]
    async fn concurrent_get_or_create_for_same_server_shares_one_attempt() {
        let registry = SessionRegistry::new(SessionRegistryConfig {
            init_timeout: Duration::from_millis(50),
            ..Default::default()
        });
        let attempts = Arc::new(AtomicUsize::new(0));
        let c = Arc::new(conn("srv1"));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let registry = registry.clone();
            let attempts = attempts.clone();
            let c = c.clone();
            handles.push(tokio::spawn(async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                let _ = registry.get_or_create(&c).await;
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(attempts.load(Ordering::SeqCst), 10);
        // All ten observed the same (removed-on-failure) holder lifecycle;
        // this is a smoke test that concurrent access doesn't deadlock or panic.
        assert!(registry.holder_state(&c.server_id).is_none());
    }
}
