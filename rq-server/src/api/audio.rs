//! Narration audio route

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::{ApiError, ApiResult, AppState};

/// GET /audio/:file
///
/// Accepts `intro` or `intro.mp3`. 404 until narration has been generated.
pub async fn get_audio(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> ApiResult<Response> {
    let segment_id = file.strip_suffix(".mp3").unwrap_or(&file);

    let audio = state
        .narration
        .audio_store()
        .load(segment_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no audio generated for '{}'", segment_id)))?;

    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], audio).into_response())
}
