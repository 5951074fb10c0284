//! Axum HTTP server for the gateway.
//!
//! This module provides the `serve()` function that runs the gateway
//! using a pre-bound `TcpListener`.

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::gateway::{Gateway, proxy_request, require_marker};

/// Path the browser shim posts to.
pub const PROXY_PATH: &str = "/api-proxy";

/// Build the gateway router.
pub fn router(gateway: Gateway) -> Router {
    let body_limit = gateway.config().max_payload_bytes;
    let marker_layer = middleware::from_fn_with_state(gateway.clone(), require_marker);
    Router::new()
        .route("/health", get(health_check))
        .route(PROXY_PATH, post(proxy_request).route_layer(marker_layer))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(gateway)
}

/// Run the gateway until the cancellation token is triggered.
///
/// # Arguments
///
/// * `listener` - Pre-bound TCP listener
/// * `gateway` - Configured gateway state
/// * `cancel` - Cancellation token for graceful shutdown
pub async fn serve(
    listener: TcpListener,
    gateway: Gateway,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    info!(
        routes = gateway.registry().len(),
        project = %gateway.config().deployment.project_id,
        region = %gateway.config().deployment.region,
        "Gateway listening on http://{addr}{PROXY_PATH}"
    );

    axum::serve(listener, router(gateway))
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await?;

    info!("Gateway shut down");
    Ok(())
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok"
    }))
}
