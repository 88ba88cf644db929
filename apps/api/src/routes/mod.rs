pub mod documents;
pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::export::handlers as export;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Editor sessions
        .route(
            "/api/v1/documents/:id",
            get(documents::handle_get_document).put(documents::handle_put_document),
        )
        .route("/api/v1/documents/:id/scan", post(documents::handle_scan))
        .route("/api/v1/documents/:id/save", post(documents::handle_save))
        .route(
            "/api/v1/documents/:id/restore",
            post(documents::handle_restore),
        )
        // Scoring and suggestions
        .route("/api/v1/documents/:id/score", post(analysis::handle_score))
        .route(
            "/api/v1/documents/:id/rewrite",
            post(analysis::handle_rewrite),
        )
        .route(
            "/api/v1/documents/:id/rewrite/:suggestion_id",
            delete(analysis::handle_cancel_rewrite),
        )
        .route(
            "/api/v1/keywords/extract",
            post(analysis::handle_extract_keywords),
        )
        // Export
        .route(
            "/api/v1/documents/:id/render-tree",
            get(export::handle_render_tree),
        )
        .route(
            "/api/v1/documents/:id/export/:format",
            post(export::handle_export),
        )
        .with_state(state)
}
