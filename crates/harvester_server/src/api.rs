//! Request handlers for the summarization endpoint.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use engine_logging::{engine_error, engine_info, engine_warn};
use harvester_core::{log_preview, truncate_chars, SubmissionPayload};
use serde::Serialize;
use serde_json::json;

use crate::archive::{Archive, ArchiveRecord};
use crate::summary::digest;

pub const PREVIEW_CHARS: usize = 200;
pub const MAX_CONTENT_CHARS: usize = 30_000;

/// Shared state for all handlers.
#[derive(Clone, Default)]
pub struct AppState {
    pub archive: Option<Arc<Archive>>,
}

#[derive(Debug, Serialize)]
pub struct SummarizeResponse {
    pub status: &'static str,
    pub summary: String,
    pub tags: Vec<String>,
}

fn error_response(status: StatusCode, detail: String) -> Response {
    (status, Json(json!({ "status": "error", "detail": detail }))).into_response()
}

/// POST /api/summarize
///
/// The body is parsed by hand so malformed input gets a JSON 400 instead of
/// the extractor's plain-text rejection.
pub async fn summarize(State(app): State<AppState>, body: Bytes) -> Response {
    let payload: SubmissionPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(err) => {
            engine_warn!("rejecting malformed submission: {}", err);
            return error_response(StatusCode::BAD_REQUEST, format!("invalid JSON body: {err}"));
        }
    };

    engine_info!(
        "submission url={:?} title={:?} tab_id={:?} chars={} preview={:?}",
        payload.url,
        payload.title,
        payload.tab_id,
        payload.content.chars().count(),
        log_preview(&payload.content, PREVIEW_CHARS)
    );

    let content = truncate_chars(&payload.content, MAX_CONTENT_CHARS);
    let digest = digest(&payload.title, content);

    if let Some(archive) = &app.archive {
        let record = ArchiveRecord {
            url: payload.url.clone(),
            title: payload.title.clone(),
            summary: digest.summary.clone(),
            tags: digest.tags.clone(),
            archived_at: chrono::Utc::now().to_rfc3339(),
        };
        // Not archived means not processed: the caller keeps the resource.
        if let Err(err) = archive.append(&record).await {
            engine_error!("archive write to {:?} failed: {}", archive.path(), err);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("archive write failed: {err}"),
            );
        }
    }

    Json(SummarizeResponse {
        status: "ok",
        summary: digest.summary,
        tags: digest.tags,
    })
    .into_response()
}

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

pub async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "not found".to_string())
}
