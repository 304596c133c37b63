//! ARSENAL Editor - WebSocket Backend
//!
//! Exposes the runtime over a long-lived bidirectional channel so a UI
//! client can edit, execute and cancel prompts cooperatively. One connection
//! owns one configuration instance; the session protocol lives in
//! [`protocol`], the state machine in [`ws`], and command execution in
//! [`session`].

pub mod config;
pub mod error;
pub mod protocol;
pub mod session;
pub mod ws;

pub use config::EditorConfig;
pub use error::{EditorError, EditorResult};
pub use ws::EditorState;

use axum::{routing::get, Json, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the editor router: the WebSocket endpoint plus a health probe.
pub fn create_router(state: Arc<EditorState>) -> Router {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "OK"}))
}
