//! rq-server library - RadioQuest story service
//!
//! Serves branching story segments, records choice votes, searches
//! segments and narrates them through a text-to-speech backend.

pub mod api;
pub mod error;
pub mod mock;
pub mod services;
pub mod store;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use rq_common::config::RuntimeConfig;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::services::{
    AudioStore, NarrationService, RetrievalService, SearchService, SpeechBackend, VoteTracker,
};
use crate::store::ContentStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: ContentStore,
    pub retrieval: Arc<RetrievalService>,
    pub search: Arc<SearchService>,
    pub votes: Arc<VoteTracker>,
    pub narration: Arc<NarrationService>,
    /// Service startup timestamp for uptime reporting
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Wire every service from the startup configuration
    pub fn new(
        config: &RuntimeConfig,
        store: ContentStore,
        speech: Option<Arc<dyn SpeechBackend>>,
    ) -> Self {
        let narration = NarrationService::new(
            speech,
            AudioStore::new(config.audio_dir()),
            store.clone(),
            &config.tts,
        );

        Self {
            retrieval: Arc::new(RetrievalService::new(store.clone())),
            search: Arc::new(SearchService::new(store.clone(), &config.search)),
            votes: Arc::new(VoteTracker::new()),
            narration: Arc::new(narration),
            startup_time: Utc::now(),
            store,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/", get(api::serve_index))
        .route("/story/:id", get(api::get_story_page))
        .route("/api/story/:id", get(api::get_story_json))
        .route("/search", get(api::search_segments))
        .route("/choice", post(api::submit_choice))
        .route("/votes/:segment_id", get(api::get_votes))
        .route("/audio/:file", get(api::get_audio))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
