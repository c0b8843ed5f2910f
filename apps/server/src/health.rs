//! HTTP status surface: informational root and `/health`.

use crate::state::{SharedStatus, StatusSummary};
use axum::{extract::State, http::header, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Status server state.
pub struct HealthState {
    /// Token symbol shown on the root page
    pub symbol: String,
    pub status: SharedStatus,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    #[serde(flatten)]
    summary: StatusSummary,
}

/// Create status router.
pub fn create_router(state: Arc<HealthState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}

async fn index_handler(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain")],
        format!("{} tracker running. Use /health for status.\n", state.symbol),
    )
}

async fn health_handler(State(state): State<Arc<HealthState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        summary: state.status.summary(),
    })
}

/// Bind `addr` and serve in the background. Returns the bound address.
pub async fn start_health_server(state: Arc<HealthState>, addr: SocketAddr) -> std::io::Result<SocketAddr> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    info!("Status server listening on http://{}", local);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Status server error: {}", e);
        }
    });

    Ok(local)
}
