//! Choice submission and vote counts

use axum::{
    extract::{Path, State},
    response::Redirect,
    Form, Json,
};
use rq_common::models::is_valid_id;
use rq_common::VoteCounts;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{ApiError, ApiResult, AppState};

/// Form body of POST /choice
#[derive(Debug, Deserialize)]
pub struct ChoiceForm {
    #[serde(default)]
    pub segment_id: Option<String>,
    #[serde(default)]
    pub choice_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VotesResponse {
    pub segment_id: String,
    pub total: u64,
    pub counts: VoteCounts,
}

/// POST /choice
///
/// Records a vote, then redirects (303) to the chosen target segment. The
/// target is the matching choice's `target_segment_id`; when the segment or
/// choice is unknown, the choice id itself names the target.
pub async fn submit_choice(
    State(state): State<AppState>,
    Form(form): Form<ChoiceForm>,
) -> ApiResult<Redirect> {
    let segment_id = required_id("segment_id", form.segment_id)?;
    let choice_id = required_id("choice_id", form.choice_id)?;

    let count = state.votes.record_vote(&segment_id, &choice_id)?;
    info!(segment_id = %segment_id, choice_id = %choice_id, count, "Choice submitted");

    let target = match state.retrieval.fetch(&segment_id).await {
        Ok(retrieved) => retrieved
            .segment
            .choice(&choice_id)
            .map(|c| c.target_segment_id.clone()),
        Err(e) => {
            debug!(segment_id = %segment_id, error = %e, "Choice on unknown segment");
            None
        }
    }
    .filter(|t| is_valid_id(t))
    .unwrap_or(choice_id);

    Ok(Redirect::to(&format!("/story/{}", target)))
}

/// GET /votes/:segment_id
pub async fn get_votes(
    State(state): State<AppState>,
    Path(segment_id): Path<String>,
) -> Json<VotesResponse> {
    let counts = state.votes.get_counts(&segment_id);
    Json(VotesResponse {
        total: counts.values().sum(),
        segment_id,
        counts,
    })
}

fn required_id(field: &str, value: Option<String>) -> ApiResult<String> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{} is required", field)))?;

    if !is_valid_id(&value) {
        return Err(ApiError::BadRequest(format!("{} is malformed", field)));
    }
    Ok(value)
}
