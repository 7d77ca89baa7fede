//! HTTP proxy surface for the browser UI.
//!
//! Three stateless POST endpoints sit in front of the resolver and the
//! reconciliation checker. Node replies are passed back as the node sent
//! them; transport problems become a generic 500 and the detail only
//! reaches the server log.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use zavax_resolver::{BlockResolver, ReconciliationChecker, ResolverConfig, ResolverError, RpcClient};

/// Body returned for any failure that is not a node answer.
const GENERIC_FAILURE: &str = "node request failed";

/// Shared state for the proxy. Read-only; nothing here changes per request.
pub struct ProxyState {
    pub rpc: RpcClient,
    pub resolver: ResolverConfig,
}

/// `{ node }`
#[derive(Debug, Deserialize)]
pub struct NodeRequest {
    pub node: String,
}

/// `{ node, block }`
#[derive(Debug, Deserialize)]
pub struct BlockRequest {
    pub node: String,
    pub block: u64,
}

/// Current head, byte for byte what the node replied.
async fn height(State(state): State<Arc<ProxyState>>, Json(req): Json<NodeRequest>) -> Response {
    match state.rpc.head_reply(&req.node).await {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => failure("height", &req.node, e),
    }
}

/// Resolve a block height; the final result is passed through as-is.
async fn block(State(state): State<Arc<ProxyState>>, Json(req): Json<BlockRequest>) -> Response {
    let resolver = BlockResolver::with_config(state.rpc.clone(), state.resolver.clone());
    match resolver.resolve(&req.node, req.block).await {
        Ok(resolution) if resolution.attempts == 0 => Json(json!({})).into_response(),
        Ok(resolution) => Json(resolution.result.to_reply()).into_response(),
        Err(e) => failure("block", &req.node, e),
    }
}

/// Mismatched heights; an empty list means agreement.
async fn reconcile(State(state): State<Arc<ProxyState>>, Json(req): Json<NodeRequest>) -> Response {
    let checker = ReconciliationChecker::new(state.rpc.clone());
    match checker.reconcile(&req.node).await {
        Ok(mismatches) => Json(mismatches.heights().to_vec()).into_response(),
        Err(e) => failure("reconcile", &req.node, e),
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

fn failure(route: &str, node: &str, e: ResolverError) -> Response {
    error!(route, node, error = %e, "proxy request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": GENERIC_FAILURE })),
    )
        .into_response()
}

/// Build the proxy router.
///
/// Auth, if ever needed, goes in as another layer here.
pub fn router(state: Arc<ProxyState>) -> Router {
    Router::new()
        .route("/api/height", post(height))
        .route("/api/block", post(block))
        .route("/api/reconcile", post(reconcile))
        .route("/api/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the proxy on an already bound listener until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: Arc<ProxyState>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "ZavaX proxy listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
