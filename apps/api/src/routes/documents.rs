//! Axum route handlers for editor sessions: store, fetch, rescan, autosave, restore.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::layout::{scan, ScanSummary};
use crate::models::ResumeDocument;
use crate::state::AppState;
use crate::store::SnapshotMeta;

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub document: Arc<ResumeDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan: Option<ScanSummary>,
}

/// PUT /api/v1/documents/:id
///
/// Validates the document, flags its layout risks and makes it the session's current copy.
pub async fn handle_put_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut document): Json<ResumeDocument>,
) -> Result<Json<DocumentResponse>, AppError> {
    document.validate()?;
    let summary = scan(&mut document);
    let document = state.sessions.put(id, document).await;

    Ok(Json(DocumentResponse {
        id,
        document,
        scan: Some(summary),
    }))
}

/// GET /api/v1/documents/:id
pub async fn handle_get_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentResponse>, AppError> {
    let document = current_document(&state, id).await?;
    Ok(Json(DocumentResponse {
        id,
        document,
        scan: None,
    }))
}

/// POST /api/v1/documents/:id/scan
pub async fn handle_scan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentResponse>, AppError> {
    let (document, summary) = state
        .sessions
        .modify(id, scan)
        .await
        .ok_or_else(|| not_found(id))?;

    Ok(Json(DocumentResponse {
        id,
        document,
        scan: Some(summary),
    }))
}

/// POST /api/v1/documents/:id/save
pub async fn handle_save(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SnapshotMeta>, AppError> {
    let document = current_document(&state, id).await?;
    let meta = state.snapshots.save(id, &document).await?;
    Ok(Json(meta))
}

/// POST /api/v1/documents/:id/restore
///
/// Replaces the session copy with the last autosaved snapshot.
pub async fn handle_restore(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentResponse>, AppError> {
    let mut document = state.snapshots.load(id).await?;
    document.validate()?;
    let summary = scan(&mut document);
    let document = state.sessions.put(id, document).await;

    Ok(Json(DocumentResponse {
        id,
        document,
        scan: Some(summary),
    }))
}

pub(crate) async fn current_document(
    state: &AppState,
    id: Uuid,
) -> Result<Arc<ResumeDocument>, AppError> {
    state.sessions.get(id).await.ok_or_else(|| not_found(id))
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Document {id} not found"))
}
