use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::app::AppState;

/// GET /: static liveness greeting.
pub async fn index_handler() -> &'static str {
    "Hello World!"
}

/// GET /health: liveness check with live connection counts.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let uptime = chrono::Utc::now() - state.started_at;
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": uptime.num_seconds(),
        "connections": state.hub.connection_count(),
        "sessions": state.registry.len(),
        "groups": state.hub.group_count(),
    }))
}
