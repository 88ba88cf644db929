//! Axum route handlers for the Export API.

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::export::render_tree::{to_render_tree, RenderTree};
use crate::export::renderer::ExportFormat;
use crate::routes::documents::current_document;
use crate::state::AppState;

/// GET /api/v1/documents/:id/render-tree
pub async fn handle_render_tree(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RenderTree>, AppError> {
    let document = current_document(&state, id).await?;
    Ok(Json(to_render_tree(&document)))
}

/// POST /api/v1/documents/:id/export/:format
///
/// Renders the current snapshot to `docx` or `pdf`. Renderer failures leave the session intact.
pub async fn handle_export(
    State(state): State<AppState>,
    Path((id, format)): Path<(Uuid, ExportFormat)>,
) -> Result<impl IntoResponse, AppError> {
    let document = current_document(&state, id).await?;
    let tree = to_render_tree(&document);
    let bytes = state.renderer.render(&tree, format).await?;

    let disposition = format!("attachment; filename=\"resume.{}\"", format.extension());
    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}
