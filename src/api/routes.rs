use axum::{
    http::Method,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use super::handlers::{errors, events, health, history, sessions, settings};
use super::state::AppState;
use super::websocket::ws_handler;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Extension origins are per-install (chrome-extension://<id>), so the
    // origin cannot be pinned; the service binds to loopback instead.
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(tower_http::cors::Any);

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Session lifecycle
        .route("/sessions", post(sessions::create_session))
        .route("/sessions/:session_id", get(sessions::get_session))
        .route("/sessions/:session_id", delete(sessions::detach_session))
        // Ingestion
        .route("/sessions/:session_id/events", post(events::record_event))
        .route("/sessions/:session_id/errors", post(errors::report_error))
        .route(
            "/sessions/:session_id/errors",
            get(errors::list_session_errors),
        )
        // Captured errors
        .route(
            "/errors/:error_id/screenshot",
            post(errors::attach_screenshot),
        )
        .route("/errors/:error_id/curl", get(errors::get_curl))
        // History
        .route("/history", get(history::get_history))
        .route("/history", delete(history::clear_history))
        .route("/history/stats", get(history::get_stats))
        // Settings
        .route("/settings", get(settings::get_settings))
        .route("/settings", put(settings::update_settings))
        // WebSocket
        .route("/ws/:client_id", get(ws_handler))
        .layer(cors)
        .with_state(state)
}
