//! Editor sessions: the current document per id, plus in-flight rewrites.
//!
//! Documents are held as `Arc<ResumeDocument>` snapshots. A pass clones the `Arc` and
//! works on that; edits go through `modify`, which copies the document if a pass still
//! holds the old snapshot and swaps the new one in.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::RwLock;
use tokio::task::AbortHandle;
use uuid::Uuid;

use crate::models::ResumeDocument;

type RewriteKey = (Uuid, String);

#[derive(Clone, Default)]
pub struct SessionStore {
    documents: Arc<RwLock<HashMap<Uuid, Arc<ResumeDocument>>>>,
    rewrites: Arc<Mutex<RewriteRegistry>>,
}

#[derive(Default)]
struct RewriteRegistry {
    next_ticket: u64,
    running: HashMap<RewriteKey, (u64, AbortHandle)>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the document for `id` and returns the new snapshot.
    pub async fn put(&self, id: Uuid, document: ResumeDocument) -> Arc<ResumeDocument> {
        let snapshot = Arc::new(document);
        self.documents.write().await.insert(id, snapshot.clone());
        snapshot
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<ResumeDocument>> {
        self.documents.read().await.get(&id).cloned()
    }

    /// Applies `edit` to the document for `id`. Snapshots handed out earlier are unaffected.
    pub async fn modify<R>(
        &self,
        id: Uuid,
        edit: impl FnOnce(&mut ResumeDocument) -> R,
    ) -> Option<(Arc<ResumeDocument>, R)> {
        let mut documents = self.documents.write().await;
        let slot = documents.get_mut(&id)?;
        let result = edit(Arc::make_mut(slot));
        Some((slot.clone(), result))
    }

    /// Registers a running rewrite, aborting any earlier one for the same suggestion.
    /// The registration lasts until the returned guard is dropped.
    pub fn track_rewrite(
        &self,
        document_id: Uuid,
        suggestion_id: &str,
        handle: AbortHandle,
    ) -> RewriteRegistration {
        let mut registry = self.lock_rewrites();
        registry.next_ticket += 1;
        let ticket = registry.next_ticket;
        if let Some((_, previous)) = registry
            .running
            .insert((document_id, suggestion_id.to_string()), (ticket, handle))
        {
            previous.abort();
        }
        RewriteRegistration {
            sessions: self.clone(),
            document_id,
            suggestion_id: suggestion_id.to_string(),
            ticket,
        }
    }

    /// Forgets a finished rewrite unless a newer one has replaced it.
    fn finish_rewrite(&self, document_id: Uuid, suggestion_id: &str, ticket: u64) {
        let mut registry = self.lock_rewrites();
        let key = (document_id, suggestion_id.to_string());
        if registry.running.get(&key).is_some_and(|(t, _)| *t == ticket) {
            registry.running.remove(&key);
        }
    }

    /// Aborts the running rewrite for this suggestion. Returns false if none was running.
    pub fn cancel_rewrite(&self, document_id: Uuid, suggestion_id: &str) -> bool {
        let removed = self
            .lock_rewrites()
            .running
            .remove(&(document_id, suggestion_id.to_string()));
        match removed {
            Some((_, handle)) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    fn lock_rewrites(&self) -> std::sync::MutexGuard<'_, RewriteRegistry> {
        self.rewrites.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A rewrite's entry in the registry. Dropping it, whether the request completed or its
/// future was dropped with the connection, removes the entry.
#[must_use = "the rewrite is unregistered as soon as this is dropped"]
pub struct RewriteRegistration {
    sessions: SessionStore,
    document_id: Uuid,
    suggestion_id: String,
    ticket: u64,
}

impl Drop for RewriteRegistration {
    fn drop(&mut self) {
        self.sessions
            .finish_rewrite(self.document_id, &self.suggestion_id, self.ticket);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::models::fixtures::standard_document;

    fn stalled_task() -> tokio::task::JoinHandle<()> {
        tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        })
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let sessions = SessionStore::new();
        let id = Uuid::new_v4();
        assert!(sessions.get(id).await.is_none());

        let doc = standard_document(&["Rust"]);
        sessions.put(id, doc.clone()).await;
        assert_eq!(*sessions.get(id).await.unwrap(), doc);
    }

    #[tokio::test]
    async fn test_modify_leaves_taken_snapshot_untouched() {
        let sessions = SessionStore::new();
        let id = Uuid::new_v4();
        sessions.put(id, standard_document(&["Rust"])).await;

        let in_flight = sessions.get(id).await.unwrap();
        let (updated, ()) = sessions
            .modify(id, |doc| doc.sections[0].heading = "Work Experience".to_string())
            .await
            .unwrap();

        assert_eq!(in_flight.sections[0].heading, "Experience");
        assert_eq!(updated.sections[0].heading, "Work Experience");
        assert_eq!(
            sessions.get(id).await.unwrap().sections[0].heading,
            "Work Experience"
        );
    }

    #[tokio::test]
    async fn test_modify_unknown_document() {
        let sessions = SessionStore::new();
        assert!(sessions.modify(Uuid::new_v4(), |_| ()).await.is_none());
    }

    #[tokio::test]
    async fn test_new_rewrite_aborts_previous_for_same_suggestion() {
        let sessions = SessionStore::new();
        let id = Uuid::new_v4();
        let first = stalled_task();
        let second = stalled_task();

        let _first = sessions.track_rewrite(id, "keyword:aws", first.abort_handle());
        let _second = sessions.track_rewrite(id, "keyword:aws", second.abort_handle());

        assert!(first.await.unwrap_err().is_cancelled());
        assert!(sessions.cancel_rewrite(id, "keyword:aws"));
        assert!(second.await.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn test_stale_registration_drop_keeps_newer_rewrite() {
        let sessions = SessionStore::new();
        let id = Uuid::new_v4();
        let first = stalled_task();
        let second = stalled_task();

        let stale = sessions.track_rewrite(id, "keyword:aws", first.abort_handle());
        let _current = sessions.track_rewrite(id, "keyword:aws", second.abort_handle());
        drop(stale);

        // The newer rewrite is still registered and can be cancelled.
        assert!(sessions.cancel_rewrite(id, "keyword:aws"));
        assert!(!sessions.cancel_rewrite(id, "keyword:aws"));
        second.abort();
    }

    #[tokio::test]
    async fn test_completed_rewrite_cannot_be_cancelled() {
        let sessions = SessionStore::new();
        let id = Uuid::new_v4();
        let task = stalled_task();

        let registration = sessions.track_rewrite(id, "keyword:aws", task.abort_handle());
        drop(registration);

        assert!(!sessions.cancel_rewrite(id, "keyword:aws"));
        task.abort();
    }

    #[tokio::test]
    async fn test_dropped_request_unregisters_rewrite() {
        let sessions = SessionStore::new();
        let id = Uuid::new_v4();
        let rewrite = stalled_task();
        let (registered_tx, registered_rx) = tokio::sync::oneshot::channel();

        // Stands in for a request handler whose connection goes away mid-rewrite.
        let request = tokio::spawn({
            let sessions = sessions.clone();
            let handle = rewrite.abort_handle();
            async move {
                let _registration = sessions.track_rewrite(id, "keyword:aws", handle);
                let _ = registered_tx.send(());
                std::future::pending::<()>().await;
            }
        });

        registered_rx.await.unwrap();
        request.abort();
        assert!(request.await.unwrap_err().is_cancelled());

        assert!(!sessions.cancel_rewrite(id, "keyword:aws"));
        rewrite.abort();
    }
}
