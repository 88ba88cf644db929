//! Snapshot persistence: autosave of session documents.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::IoError;
use crate::models::ResumeDocument;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotMeta {
    pub document_id: Uuid,
    pub saved_at: DateTime<Utc>,
    pub bytes: usize,
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn save(&self, id: Uuid, document: &ResumeDocument) -> Result<SnapshotMeta, IoError>;
    async fn load(&self, id: Uuid) -> Result<ResumeDocument, IoError>;
}

/// One JSON file per document under `dir`. Writes go to a temp file in the same
/// directory and are renamed into place, so a crash never leaves a half-written snapshot.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn save(&self, id: Uuid, document: &ResumeDocument) -> Result<SnapshotMeta, IoError> {
        let bytes = serde_json::to_vec_pretty(document)?;
        let len = bytes.len();
        let dir = self.dir.clone();
        let path = self.path_for(id);

        tokio::task::spawn_blocking(move || write_atomic(&dir, &path, &bytes))
            .await
            .map_err(|e| IoError::Fs(std::io::Error::new(std::io::ErrorKind::Other, e)))??;

        info!("Saved snapshot {} ({} bytes)", id, len);
        Ok(SnapshotMeta {
            document_id: id,
            saved_at: Utc::now(),
            bytes: len,
        })
    }

    async fn load(&self, id: Uuid) -> Result<ResumeDocument, IoError> {
        let path = self.path_for(id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(IoError::SnapshotNotFound(id))
            }
            Err(e) => return Err(e.into()),
        };
        debug!("Loaded snapshot {} from {}", id, path.display());
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn write_atomic(dir: &Path, path: &Path, bytes: &[u8]) -> Result<(), IoError> {
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::standard_document;

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());
        let doc = standard_document(&["Built Rust services"]);
        let id = Uuid::new_v4();

        let meta = store.save(id, &doc).await.unwrap();
        assert_eq!(meta.document_id, id);
        assert!(meta.bytes > 0);
        assert_eq!(store.load(id).await.unwrap(), doc);
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());
        let id = Uuid::new_v4();

        store.save(id, &standard_document(&["v1"])).await.unwrap();
        let latest = standard_document(&["v2"]);
        store.save(id, &latest).await.unwrap();

        assert_eq!(store.load(id).await.unwrap(), latest);
        // Only the snapshot itself remains; temp files were renamed away.
        let files = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(files, 1);
    }

    #[tokio::test]
    async fn test_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("nested/snapshots"));
        let id = Uuid::new_v4();
        store.save(id, &standard_document(&[])).await.unwrap();
        assert!(store.load(id).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());
        let id = Uuid::new_v4();
        assert!(matches!(
            store.load(id).await,
            Err(IoError::SnapshotNotFound(missing)) if missing == id
        ));
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_encoding_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());
        let id = Uuid::new_v4();
        std::fs::write(dir.path().join(format!("{id}.json")), b"{ not json").unwrap();
        assert!(matches!(store.load(id).await, Err(IoError::Encoding(_))));
    }
}
