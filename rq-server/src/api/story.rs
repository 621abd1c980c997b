//! Story segment routes
//!
//! Both routes share one flow: retrieve the segment, then try to narrate it.
//! Narration problems are logged and the segment is served without audio.

use axum::{
    extract::{Path, State},
    response::Html,
    Json,
};
use rq_common::{Error, Segment, VoteCounts};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::services::{NarrationMetadata, NarrationOutcome, Retrieved, SegmentSource};
use crate::{ApiResult, AppState};

/// JSON view of a segment
#[derive(Debug, Serialize)]
pub struct StoryResponse {
    pub source: SegmentSource,
    pub segment: Segment,
    pub narration: NarrationMetadata,
    pub votes: VoteCounts,
}

/// GET /story/:id
///
/// Rendered segment page with an audio player and one form per choice.
pub async fn get_story_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Html<String>> {
    let retrieved = load_story(&state, &id).await?;
    Ok(Html(render_segment(&retrieved.segment)))
}

/// GET /api/story/:id
pub async fn get_story_json(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<StoryResponse>> {
    let Retrieved { segment, source } = load_story(&state, &id).await?;

    Ok(Json(StoryResponse {
        source,
        narration: state.narration.metadata(&segment),
        votes: state.votes.get_counts(&segment.id),
        segment,
    }))
}

async fn load_story(state: &AppState, id: &str) -> ApiResult<Retrieved> {
    info!(segment_id = %id, "Fetching story segment");
    let mut retrieved = state.retrieval.fetch(id).await?;

    match state.narration.ensure_narration(&mut retrieved.segment).await {
        Ok(NarrationOutcome::Generated { bytes }) => {
            info!(segment_id = %id, bytes, "Narration ready");
        }
        Ok(NarrationOutcome::AlreadyPresent) => {}
        Err(Error::BackendUnavailable(msg)) => {
            warn!(segment_id = %id, "Serving without audio: {}", msg);
        }
        Err(e) => {
            error!(segment_id = %id, error = %e, "Narration failed, serving without audio");
        }
    }

    Ok(retrieved)
}

/// Render a segment as a standalone HTML page
pub fn render_segment(segment: &Segment) -> String {
    let mut html = String::with_capacity(segment.content.len() + 1024);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{} - RadioQuest</title>\n", escape_html(&segment.title)));
    html.push_str("</head>\n<body>\n<main class=\"segment\">\n");
    html.push_str(&format!("<h1>{}</h1>\n", escape_html(&segment.title)));

    if let Some(url) = &segment.audio_url {
        html.push_str(&format!(
            "<audio controls src=\"{}\"></audio>\n",
            escape_html(url)
        ));
    }

    for paragraph in segment.content.split("\n\n").filter(|p| !p.trim().is_empty()) {
        html.push_str(&format!("<p>{}</p>\n", escape_html(paragraph.trim())));
    }

    if segment.is_terminal() {
        html.push_str("<p class=\"the-end\">The End.</p>\n<a href=\"/story/intro\">Start a new adventure</a>\n");
    } else {
        html.push_str("<ul class=\"choices\">\n");
        for choice in &segment.choices {
            html.push_str(&format!(
                "<li><form method=\"post\" action=\"/choice\">\
                 <input type=\"hidden\" name=\"segment_id\" value=\"{}\">\
                 <input type=\"hidden\" name=\"choice_id\" value=\"{}\">\
                 <button type=\"submit\">{}</button></form></li>\n",
                escape_html(&segment.id),
                escape_html(&choice.choice_id),
                escape_html(&choice.label),
            ));
        }
        html.push_str("</ul>\n");
    }

    html.push_str("</main>\n</body>\n</html>\n");
    html
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
