use axum::{http::Method, routing::get, Router};
use chrono::{DateTime, Utc};
use relay_core::{
    config::RelayConfig,
    types::{ConnId, UserId},
};
use relay_sessions::ConnectionRegistry;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::debug;

use crate::auth::CredentialValidator;
use crate::ws::broadcast::ChannelHub;

/// Central shared state, passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: RelayConfig,
    /// conn_id -> session (user id + current channel)
    pub registry: ConnectionRegistry,
    /// group membership and outbound queues
    pub hub: ChannelHub,
    /// Present only in `validate` auth mode.
    pub validator: Option<Arc<dyn CredentialValidator>>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: RelayConfig, validator: Option<Arc<dyn CredentialValidator>>) -> Self {
        Self {
            config,
            registry: ConnectionRegistry::new(),
            hub: ChannelHub::new(),
            validator,
            started_at: Utc::now(),
        }
    }

    /// Tear down everything a closed connection owned. Called once per connection.
    pub fn release(&self, conn: &ConnId) {
        let session = self.registry.remove(conn);
        let left = self.hub.detach(conn);
        let user = session.and_then(|s| s.user_id);
        debug!(
            conn_id = %conn,
            user_id = %UserId::label(user.as_ref()),
            group = ?left,
            "connection state released"
        );
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST]);

    Router::new()
        .route("/", get(crate::http::health::index_handler))
        .route("/health", get(crate::http::health::health_handler))
        .route("/ws", get(crate::ws::connection::ws_handler))
        .with_state(state)
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
