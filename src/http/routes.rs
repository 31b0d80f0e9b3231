//! Routers and shared server state.
//!
//! Two routers back the two listeners: the page router serves static assets
//! (including the filtered word list clients validate against) and a health
//! check; the realtime router carries the WebSocket protocol.

use std::sync::Arc;

use axum::http::{header, Method};
use axum::routing::get;
use axum::Router;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config;
use crate::room::RoomManager;
use crate::ws;
use crate::ws::dispatch::{Dispatcher, Inbound};
use crate::ws::registry::ConnectionRegistry;

/// Process-wide stores, created at server start and owned by the routers.
#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<RoomManager>,
    pub registry: Arc<ConnectionRegistry>,
    pub inbound: mpsc::UnboundedSender<Inbound>,
}

impl AppState {
    /// Build the stores and start the dispatcher task feeding on inbound
    /// frames. Must be called inside a tokio runtime.
    pub fn new() -> Self {
        let rooms = Arc::new(RoomManager::new());
        let registry = Arc::new(ConnectionRegistry::new());
        let inbound = Dispatcher::new(rooms.clone(), registry.clone()).spawn();
        Self {
            rooms,
            registry,
            inbound,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

async fn healthz() -> &'static str {
    "ok"
}

/// Router for the page listener.
pub fn page_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .fallback_service(ServeDir::new(config::static_dir()))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Router for the realtime listener.
pub fn realtime_router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws::connection::ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
