mod analysis;
mod config;
mod errors;
mod export;
mod layout;
mod llm_client;
mod models;
mod routes;
mod session;
mod state;
mod store;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::rewrite::{TextCompletion, UnconfiguredCompletion};
use crate::config::Config;
use crate::export::renderer::{DocumentRenderer, HttpRenderer, UnconfiguredRenderer};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::session::SessionStore;
use crate::state::AppState;
use crate::store::FileSnapshotStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ATS engine v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Keyword tables {} (top {} keywords, weights layout={} keywords={})",
        config.engine.tables.version(),
        config.engine.top_keyword_count,
        config.engine.layout_weight,
        config.engine.keyword_weight
    );

    // Text completion for rewrites (optional)
    let completion: Arc<dyn TextCompletion> = match &config.anthropic_api_key {
        Some(key) => {
            let llm = LlmClient::new(key.clone())?;
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Arc::new(llm)
        }
        None => {
            warn!("ANTHROPIC_API_KEY not set; rewrites are unavailable");
            Arc::new(UnconfiguredCompletion)
        }
    };

    // Document renderer (optional)
    let renderer: Arc<dyn DocumentRenderer> = match &config.renderer_url {
        Some(url) => {
            info!("Renderer at {url}");
            Arc::new(HttpRenderer::new(url.clone())?)
        }
        None => {
            warn!("RENDERER_URL not set; DOCX/PDF export is unavailable");
            Arc::new(UnconfiguredRenderer)
        }
    };

    let snapshots = Arc::new(FileSnapshotStore::new(config.snapshot_dir.clone()));
    info!("Snapshots stored in {}", config.snapshot_dir.display());

    // Build app state
    let state = AppState {
        config: config.clone(),
        sessions: SessionStore::new(),
        completion,
        renderer,
        snapshots,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
