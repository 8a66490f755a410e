//! Relay server: accepts arbitrary JSON updates and hands back the full list
//!
//! The list lives in memory only, grows without bound and is lost on
//! restart. There is no authentication.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tequmsa_core::{PullUpdatesResponse, RelayConfig, RelayHealth, UpdateAck};
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Default)]
pub struct RelayState {
    updates: RwLock<Vec<Value>>,
    last_update: RwLock<Option<DateTime<Utc>>>,
}

impl RelayState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an update; returns the new list length.
    pub async fn push(&self, payload: Value) -> usize {
        let mut updates = self.updates.write().await;
        updates.push(payload);
        *self.last_update.write().await = Some(Utc::now());
        updates.len()
    }

    /// Snapshot of every update in arrival order.
    pub async fn snapshot(&self) -> Vec<Value> {
        self.updates.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.updates.read().await.len()
    }
}

/// Build the relay router around shared state.
pub fn router(state: Arc<RelayState>) -> Router {
    Router::new()
        .route("/api/updates", post(push_handler))
        .route("/api/pull_updates", get(pull_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_relay(config: RelayConfig) -> anyhow::Result<()> {
    let state = Arc::new(RelayState::new());
    let app = router(state);

    let bind_addr: SocketAddr = format!("{}:{}", config.bind.to_addr(), config.port).parse()?;

    info!("Tequmsa relay v{} starting", env!("CARGO_PKG_VERSION"));
    info!("  Listening on: {}", bind_addr);
    info!("  Push: POST http://{}/api/updates", bind_addr);
    info!("  Pull: GET  http://{}/api/pull_updates", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn push_handler(State(state): State<Arc<RelayState>>, Json(payload): Json<Value>) -> impl IntoResponse {
    info!("Update received: {}", payload);
    let total = state.push(payload).await;
    tracing::debug!("Relay holds {} updates", total);
    (StatusCode::OK, Json(UpdateAck::dispatched()))
}

async fn pull_handler(State(state): State<Arc<RelayState>>) -> impl IntoResponse {
    Json(PullUpdatesResponse {
        updates: state.snapshot().await,
    })
}

async fn health_handler(State(state): State<Arc<RelayState>>) -> impl IntoResponse {
    Json(RelayHealth {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        updates: state.len().await,
        last_update: *state.last_update.read().await,
    })
}
