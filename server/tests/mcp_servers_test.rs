//! Integration tests for the MCP-server administration and approval-policy
//! routes, driven through the router with `tower::ServiceExt::oneshot`
//! rather than a bound TCP listener.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use conduit_mcp::{ApprovalPolicyService, McpClientFacade, SessionRegistry, ToolDefinitionProvider};
use conduit_orchestrator::{Orchestrator, ServerSyncJob, UpstreamClient};
use conduit_persistence::InMemoryConversationStore;
use conduit_secrets::AesGcmDecryptor;
use conduit_server::config::AppConfig;
use conduit_server::state::AppState;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

const TEST_KEY_HEX: &str = "0101010101010101010101010101010101010101010101010101010101010101";

fn test_config() -> AppConfig {
    AppConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        database_url: None,
        upstream_base_url: "http://127.0.0.1:9".to_string(),
        upstream_default_model: "gpt-4o".to_string(),
        upstream_api_key: Some("test-upstream-key".to_string()),
        mcp_initialization_timeout_ms: 1_000,
        mcp_operation_timeout_ms: 1_000,
        mcp_idle_timeout_ms: 60_000,
        mcp_cache_ttl_ms: 300_000,
        tool_execution_timeout_ms: 1_000,
        max_retries: 1,
        retry_backoff_base_ms: 1,
        secret_encryption_key: TEST_KEY_HEX.to_string(),
        log_dir: None,
    }
}

fn test_state() -> AppState {
    let config = test_config();
    let secret_key = config.decode_secret_key().expect("test key decodes");
    let store = Arc::new(InMemoryConversationStore::new());
    let registry = SessionRegistry::new(config.session_registry_config());
    let facade = Arc::new(McpClientFacade::new(registry));
    let policies = Arc::new(ApprovalPolicyService::new(store.clone()));
    let tool_provider = Arc::new(ToolDefinitionProvider::new(policies.clone()));
    let secret_decryptor = Arc::new(AesGcmDecryptor::new(&secret_key).expect("valid key"));
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

    AppState {
        store,
        orchestrator,
        facade,
        policies,
        sync_job,
        secret_key,
        config: Arc::new(config),
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn create_list_and_delete_mcp_server_round_trip() {
    let app = conduit_server::routes::build_router(test_state());

    let create_req = Request::builder()
        .method("POST")
        .uri("/mcp/servers")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "server_id": "srv-1",
                "name": "Test Server",
                "base_url": "http://127.0.0.1:9001",
                "api_key": "s3cr3t",
                "transport": "SSE",
            })
            .to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(create_req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let created = json_body(response).await;
    assert_eq!(created["server_id"], "srv-1");
    assert_eq!(created["has_api_key"], true);
    assert!(created.get("api_key_enc").is_none());

    let list_req = Request::builder().uri("/mcp/servers").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(list_req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listed = json_body(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let delete_req = Request::builder()
        .method("DELETE")
        .uri("/mcp/servers/srv-1")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(delete_req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let list_req = Request::builder().uri("/mcp/servers").body(Body::empty()).unwrap();
    let response = app.oneshot(list_req).await.unwrap();
    let listed = json_body(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn create_mcp_server_rejects_unknown_transport() {
    let app = conduit_server::routes::build_router(test_state());
    let req = Request::builder()
        .method("POST")
        .uri("/mcp/servers")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "server_id": "srv-2",
                "name": "Bad Transport",
                "base_url": "http://127.0.0.1:9002",
                "api_key": null,
                "transport": "CARRIER_PIGEON",
            })
            .to_string(),
        ))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "invalid_request");
}

#[tokio::test]
async fn verify_unknown_server_is_404() {
    let app = conduit_server::routes::build_router(test_state());
    let req = Request::builder()
        .method("POST")
        .uri("/mcp/servers/does-not-exist/verify")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn approval_policy_defaults_to_never_then_round_trips_through_put() {
    let app = conduit_server::routes::build_router(test_state());

    let get_req = Request::builder()
        .uri("/mcp/servers/srv-3/tools/search/approval-policy")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(get_req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let policy = json_body(response).await;
    assert_eq!(policy["policy"], "Never");

    let put_req = Request::builder()
        .method("PUT")
        .uri("/mcp/servers/srv-3/tools/search/approval-policy")
        .header("content-type", "application/json")
        .body(Body::from(json!({"policy": "Always"}).to_string()))
        .unwrap();
    let response = app.clone().oneshot(put_req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let get_req = Request::builder()
        .uri("/mcp/servers/srv-3/tools/search/approval-policy")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(get_req).await.unwrap();
    let policy = json_body(response).await;
    assert_eq!(policy["policy"], "Always");
}
