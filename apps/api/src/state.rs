use std::sync::Arc;

use crate::analysis::rewrite::TextCompletion;
use crate::config::Config;
use crate::export::renderer::DocumentRenderer;
use crate::session::SessionStore;
use crate::store::SnapshotStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Current document per editor session.
    pub sessions: SessionStore,
    /// Pluggable text completion. `LlmClient` when an API key is set.
    pub completion: Arc<dyn TextCompletion>,
    pub renderer: Arc<dyn DocumentRenderer>,
    pub snapshots: Arc<dyn SnapshotStore>,
}
