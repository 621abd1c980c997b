//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use rq_common::SearchMode;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    /// "connected" or "disconnected"
    pub store: String,
    /// "initialized" or "not_initialized"
    pub tts: String,
    pub search_mode: SearchMode,
    pub uptime_seconds: i64,
}

/// GET /health
///
/// Reports process status and backend availability. Never fails: a missing
/// backend degrades the service, it does not take it down.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let store = if state.store.is_available() {
        "connected"
    } else {
        "disconnected"
    };
    let tts = if state.narration.is_available() {
        "initialized"
    } else {
        "not_initialized"
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "rq-server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: store.to_string(),
        tts: tts.to_string(),
        search_mode: state.search.mode(),
        uptime_seconds: (Utc::now() - state.startup_time).num_seconds(),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
