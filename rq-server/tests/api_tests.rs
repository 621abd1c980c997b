//! Integration tests for rq-server HTTP routes
//!
//! Each test builds the router over an in-memory SQLite store (or no store)
//! and drives it with `oneshot`, so no network port is bound.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use rq_common::config::RuntimeConfig;
use rq_common::{Choice, SearchMode, Segment};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use rq_server::services::{SpeechBackend, VoiceConfig};
use rq_server::store::ContentStore;
use rq_server::{build_router, AppState};

/// Speech backend that returns fixed bytes and counts calls
struct FakeSpeech {
    calls: AtomicUsize,
}

#[async_trait]
impl SpeechBackend for FakeSpeech {
    fn backend_id(&self) -> &'static str {
        "fake"
    }

    async fn synthesize(
        &self,
        _text: &str,
        _voice: &VoiceConfig,
    ) -> rq_common::Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(b"ID3fake-mp3".to_vec())
    }
}

struct TestApp {
    state: AppState,
    _root: TempDir,
}

impl TestApp {
    fn router(&self) -> Router {
        build_router(self.state.clone())
    }
}

/// Store with `intro -> forest` where the choice id differs from the target
async fn seeded_store() -> ContentStore {
    let store = ContentStore::in_memory().await.unwrap();
    let intro = Segment::new("intro", "The Journey Begins", "A message crackles over your radio.")
        .with_choice(Choice::new("a", "Enter the forest", "forest"));
    let forest = Segment::new("forest", "Into the Jungle", "Antelope tracks lead to a baobab tree.");
    store.upsert(&intro).await.unwrap();
    store.upsert(&forest).await.unwrap();
    store
}

fn test_app(
    store: ContentStore,
    mode: SearchMode,
    speech: Option<Arc<dyn SpeechBackend>>,
) -> TestApp {
    let root = tempfile::tempdir().unwrap();
    let mut config = RuntimeConfig::with_root(root.path());
    config.search.mode = mode;
    TestApp {
        state: AppState::new(&config, store, speech),
        _root: root,
    }
}

async fn get(app: Router, uri: &str) -> axum::response::Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn post_form(app: Router, uri: &str, body: &str) -> axum::response::Response {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).expect("Should parse JSON")
}

// =============================================================================
// Story retrieval
// =============================================================================

#[tokio::test]
async fn test_story_json_from_store() {
    let app = test_app(seeded_store().await, SearchMode::Lexical, None);

    let response = get(app.router(), "/api/story/intro").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["source"], "store");
    assert_eq!(body["segment"]["id"], "intro");
    assert_eq!(body["segment"]["choices"][0]["target_segment_id"], "forest");
    assert_eq!(body["narration"]["tts_ready"], false);
    assert!(body["segment"].get("audio_url").is_none());
}

#[tokio::test]
async fn test_story_falls_back_to_mock_without_store() {
    let app = test_app(ContentStore::unavailable(), SearchMode::Lexical, None);

    let response = get(app.router(), "/api/story/mountain").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["source"], "mock");
    assert_eq!(body["segment"]["title"], "Mountain Peak Stories");
}

#[tokio::test]
async fn test_story_not_found_is_404() {
    let app = test_app(seeded_store().await, SearchMode::Lexical, None);

    let response = get(app.router(), "/story/nowhere").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_story_page_renders_html() {
    let app = test_app(seeded_store().await, SearchMode::Lexical, None);

    let response = get(app.router(), "/story/intro").await;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.contains("text/html"));

    let html = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(html.contains("<h1>The Journey Begins</h1>"));
    assert!(html.contains("name=\"choice_id\" value=\"a\""));
}

// =============================================================================
// Narration
// =============================================================================

#[tokio::test]
async fn test_story_generates_audio_once() {
    let speech = Arc::new(FakeSpeech {
        calls: AtomicUsize::new(0),
    });
    let app = test_app(seeded_store().await, SearchMode::Lexical, Some(speech.clone()));

    // No audio before the segment is first served
    let response = get(app.router(), "/audio/intro.mp3").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(get(app.router(), "/api/story/intro").await).await;
    assert_eq!(body["segment"]["audio_url"], "/audio/intro.mp3");
    assert_eq!(body["narration"]["tts_ready"], true);

    // Second fetch reuses the stored URL
    let body = body_json(get(app.router(), "/api/story/intro").await).await;
    assert_eq!(body["segment"]["audio_url"], "/audio/intro.mp3");
    assert_eq!(speech.calls.load(Ordering::SeqCst), 1);

    let response = get(app.router(), "/audio/intro.mp3").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
    assert_eq!(body_bytes(response).await, b"ID3fake-mp3");
}

#[tokio::test]
async fn test_audio_invalid_id_is_400() {
    let app = test_app(ContentStore::unavailable(), SearchMode::Lexical, None);

    let response = get(app.router(), "/audio/bad..id").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Choices and votes
// =============================================================================

#[tokio::test]
async fn test_choice_redirects_to_target_and_counts_vote() {
    let app = test_app(seeded_store().await, SearchMode::Lexical, None);

    let response = post_form(app.router(), "/choice", "segment_id=intro&choice_id=a").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/story/forest");

    assert_eq!(app.state.votes.get_counts("intro")["a"], 1);

    let body = body_json(get(app.router(), "/votes/intro").await).await;
    assert_eq!(body["counts"]["a"], 1);
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn test_unknown_choice_is_tracked_and_names_target() {
    let app = test_app(ContentStore::unavailable(), SearchMode::Lexical, None);

    let response = post_form(app.router(), "/choice", "segment_id=intro&choice_id=lake").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/story/lake");
    assert_eq!(app.state.votes.get_counts("intro")["lake"], 1);
}

#[tokio::test]
async fn test_choice_missing_fields_is_400() {
    let app = test_app(seeded_store().await, SearchMode::Lexical, None);

    let response = post_form(app.router(), "/choice", "segment_id=intro").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_form(app.router(), "/choice", "segment_id=&choice_id=a").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert!(app.state.votes.get_counts("intro").is_empty());
}

#[tokio::test]
async fn test_concurrent_choice_submissions_all_count() {
    let app = test_app(seeded_store().await, SearchMode::Lexical, None);

    let requests: Vec<_> = (0..50)
        .map(|_| {
            let router = app.router();
            tokio::spawn(async move {
                post_form(router, "/choice", "segment_id=intro&choice_id=a").await
            })
        })
        .collect();
    for request in requests {
        assert_eq!(request.await.unwrap().status(), StatusCode::SEE_OTHER);
    }

    assert_eq!(app.state.votes.get_counts("intro")["a"], 50);
}

// =============================================================================
// Search
// =============================================================================

#[tokio::test]
async fn test_search_empty_query_is_400() {
    let app = test_app(seeded_store().await, SearchMode::Lexical, None);

    let response = get(app.router(), "/search?q=").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = get(app.router(), "/search").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_lexical_matches() {
    let app = test_app(seeded_store().await, SearchMode::Lexical, None);

    let response = get(app.router(), "/search?q=BAOBAB").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["mode"], "lexical");
    assert_eq!(body["result_count"], 1);
    assert_eq!(body["results"][0]["id"], "forest");
    assert!(body["results"][0].get("score").is_none());
}

#[tokio::test]
async fn test_search_semantic_returns_scores() {
    let store = seeded_store().await;
    let app = test_app(store, SearchMode::Semantic, None);
    app.state.search.build_index().await.unwrap();

    let response = get(app.router(), "/search?q=baobab%20tree").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["mode"], "semantic");
    assert_eq!(body["results"][0]["id"], "forest");
    assert!(body["results"][0]["score"].is_number());
}

// =============================================================================
// Health and landing page
// =============================================================================

#[tokio::test]
async fn test_health_reports_backends() {
    let app = test_app(seeded_store().await, SearchMode::Lexical, None);

    let body = body_json(get(app.router(), "/health").await).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["module"], "rq-server");
    assert_eq!(body["store"], "connected");
    assert_eq!(body["tts"], "not_initialized");
    assert_eq!(body["search_mode"], "lexical");

    let offline = test_app(ContentStore::unavailable(), SearchMode::Semantic, None);
    let body = body_json(get(offline.router(), "/health").await).await;
    assert_eq!(body["store"], "disconnected");
    assert_eq!(body["search_mode"], "semantic");
}

#[tokio::test]
async fn test_index_page() {
    let app = test_app(ContentStore::unavailable(), SearchMode::Lexical, None);

    let response = get(app.router(), "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(html.contains("/story/intro"));
}
