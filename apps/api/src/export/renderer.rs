//! Renderer collaborator: turns a `RenderTree` into DOCX or PDF bytes.
//!
//! `AppState` holds an `Arc<dyn DocumentRenderer>`: `HttpRenderer` when `RENDERER_URL` is
//! set, `UnconfiguredRenderer` otherwise.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::IoError;
use crate::export::render_tree::RenderTree;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Docx,
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Docx => "docx",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ExportFormat::Pdf => "application/pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render(&self, tree: &RenderTree, format: ExportFormat) -> Result<Bytes, IoError>;
}

/// Posts the tree as JSON to `{base_url}/render/{format}` and returns the response body.
#[derive(Clone)]
pub struct HttpRenderer {
    client: Client,
    base_url: String,
}

impl HttpRenderer {
    pub fn new(base_url: impl Into<String>) -> Result<Self, IoError> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(60)).build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, format: ExportFormat) -> String {
        format!("{}/render/{}", self.base_url, format)
    }
}

#[async_trait]
impl DocumentRenderer for HttpRenderer {
    async fn render(&self, tree: &RenderTree, format: ExportFormat) -> Result<Bytes, IoError> {
        let response = self
            .client
            .post(self.endpoint(format))
            .json(tree)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!("Renderer returned {} for {}: {}", status, format, message);
            return Err(IoError::Render {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        info!("Rendered {} ({} bytes)", format, body.len());
        Ok(body)
    }
}

/// Used when no renderer is configured; every export fails with `RendererUnavailable`.
pub struct UnconfiguredRenderer;

#[async_trait]
impl DocumentRenderer for UnconfiguredRenderer {
    async fn render(&self, _tree: &RenderTree, _format: ExportFormat) -> Result<Bytes, IoError> {
        Err(IoError::RendererUnavailable)
    }
}
