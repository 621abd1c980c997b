//! Segment search route

use axum::{
    extract::{Query, State},
    Json,
};
use rq_common::{SearchHit, SearchMode};
use serde::{Deserialize, Serialize};

use crate::{ApiError, ApiResult, AppState};

/// Query parameters for search
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub mode: SearchMode,
    pub result_count: usize,
    pub results: Vec<SearchHit>,
}

/// GET /search?q=text
///
/// 400 when `q` is missing or blank; no backend is queried in that case.
pub async fn search_segments(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<SearchResponse>> {
    let q = query
        .q
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Please provide a search query".to_string()))?;

    let results = state.search.search(&q).await?;

    Ok(Json(SearchResponse {
        query: q,
        mode: state.search.mode(),
        result_count: results.len(),
        results,
    }))
}
