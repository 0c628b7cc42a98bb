pub mod approval_policies;
pub mod mcp_servers;
pub mod responses;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/responses/stream", post(responses::stream))
        .route("/responses/approval-response", post(responses::approval_response))
        .route("/mcp/servers", get(mcp_servers::list).post(mcp_servers::create))
        .route("/mcp/servers/{id}", delete(mcp_servers::delete))
        .route("/mcp/servers/{id}/verify", post(mcp_servers::verify))
        .route("/mcp/servers/{id}/sync", post(mcp_servers::sync))
        .route("/mcp/servers/{id}/capabilities", get(mcp_servers::capabilities))
        .route("/mcp/servers/{id}/status/stream", get(mcp_servers::status_stream))
        .route(
            "/mcp/servers/{id}/tools/approval-policies",
            get(approval_policies::list_for_server),
        )
        .route(
            "/mcp/servers/{id}/tools/{tool}/approval-policy",
            get(approval_policies::get).put(approval_policies::put).delete(approval_policies::delete),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
