//! Axum route handlers for scoring, rewrites and keyword extraction.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::analysis::job_description::analyze;
use crate::analysis::keywords::{extract, KeywordProfile, KeywordRole};
use crate::analysis::rewrite::{spawn_rewrite, RewriteContext};
use crate::analysis::scoring::score;
use crate::errors::AppError;
use crate::models::{ScoreReport, Suggestion};
use crate::routes::documents::current_document;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    /// Empty or missing text scores keywords as fully covered and warns about it.
    #[serde(default)]
    pub job_description: String,
}

#[derive(Debug, Deserialize)]
pub struct RewriteRequest {
    pub suggestion: Suggestion,
}

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub text: String,
    pub role: KeywordRole,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/documents/:id/score
///
/// Scores the session's current snapshot. Edits made while the pass runs do not affect it.
pub async fn handle_score(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ScoreRequest>,
) -> Result<Json<ScoreReport>, AppError> {
    let document = current_document(&state, id).await?;
    let engine = &state.config.engine;

    let job = analyze(&request.job_description, &engine.tables);
    let report = score(&document, &job, engine)?;

    Ok(Json(report))
}

/// POST /api/v1/documents/:id/rewrite
///
/// Asks the completion service to phrase a fix for one suggestion. A newer request for the
/// same suggestion cancels this one.
pub async fn handle_rewrite(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RewriteRequest>,
) -> Result<Json<Suggestion>, AppError> {
    let document = current_document(&state, id).await?;
    let suggestion = request.suggestion;
    let context = RewriteContext::from_document(&document, &suggestion)?;
    let suggestion_id = suggestion.id.clone();

    let pending = spawn_rewrite(
        state.completion.clone(),
        suggestion,
        context,
        state.config.rewrite_timeout,
    );
    let _registration = state
        .sessions
        .track_rewrite(id, &suggestion_id, pending.abort_handle());

    let rewritten = pending.wait().await?;
    Ok(Json(rewritten))
}

/// DELETE /api/v1/documents/:id/rewrite/:suggestion_id
pub async fn handle_cancel_rewrite(
    State(state): State<AppState>,
    Path((id, suggestion_id)): Path<(Uuid, String)>,
) -> Result<StatusCode, AppError> {
    if state.sessions.cancel_rewrite(id, &suggestion_id) {
        info!("Cancelled rewrite {} for document {}", suggestion_id, id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!(
            "No rewrite running for suggestion {suggestion_id}"
        )))
    }
}

/// POST /api/v1/keywords/extract
pub async fn handle_extract_keywords(
    State(state): State<AppState>,
    Json(request): Json<ExtractRequest>,
) -> Result<Json<KeywordProfile>, AppError> {
    Ok(Json(extract(
        &request.text,
        request.role,
        &state.config.engine.tables,
    )))
}
