//! AI rewrites for a single suggestion.
//!
//! The only I/O-suspending step of a pass. One attempt per request, bounded by a timeout;
//! callers cancel by dropping the future or, for spawned rewrites, through
//! `PendingRewrite::cancel`. A failed rewrite never touches the report it came from.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{info, warn};

use crate::errors::ServiceError;
use crate::llm_client::prompts::build_rewrite_prompt;
use crate::models::{ResumeDocument, Suggestion, ValidationError};

/// Black-box text completion. Implemented by `LlmClient`; swapped for fakes in tests.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ServiceError>;
}

/// Used when no API key is configured; every rewrite fails with `Unavailable`.
pub struct UnconfiguredCompletion;

#[async_trait]
impl TextCompletion for UnconfiguredCompletion {
    async fn complete(&self, _prompt: &str) -> Result<String, ServiceError> {
        Err(ServiceError::Unavailable)
    }
}

/// What the model sees around the suggestion: where it sits and the lines next to it.
#[derive(Debug, Clone, PartialEq)]
pub struct RewriteContext {
    pub section_heading: String,
    /// "Title, Organization" when the suggestion points into an entry.
    pub entry_heading: Option<String>,
    /// The block text being rewritten, when the suggestion points at a block.
    pub original: Option<String>,
    /// Other block texts of the same entry, in order.
    pub neighbours: Vec<String>,
    pub issue: String,
    pub target: Option<String>,
}

impl RewriteContext {
    /// Fails when the suggestion's location no longer exists in `document`.
    pub fn from_document(
        document: &ResumeDocument,
        suggestion: &Suggestion,
    ) -> Result<Self, ValidationError> {
        let mut context = RewriteContext {
            section_heading: "Resume".to_string(),
            entry_heading: None,
            original: None,
            neighbours: Vec::new(),
            issue: suggestion.message.clone(),
            target: suggestion.target.clone(),
        };

        let Some(location) = suggestion.location_ref else {
            return Ok(context);
        };
        let resolved = document.resolve(&location)?;

        context.section_heading = if resolved.section.heading.trim().is_empty() {
            resolved.section.kind.label().to_string()
        } else {
            resolved.section.heading.trim().to_string()
        };

        if let Some(entry) = resolved.entry {
            let heading: Vec<&str> = [entry.title.as_deref(), entry.organization.as_deref()]
                .into_iter()
                .flatten()
                .filter(|s| !s.trim().is_empty())
                .collect();
            if !heading.is_empty() {
                context.entry_heading = Some(heading.join(", "));
            }
            context.neighbours = entry
                .blocks
                .iter()
                .filter(|b| Some(b.id) != resolved.block.map(|own| own.id))
                .map(|b| b.text.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
        }
        context.original = resolved.block.map(|b| b.text.trim().to_string());

        Ok(context)
    }
}

/// Asks the completion service for replacement text and returns a copy of `suggestion`
/// carrying it.
pub async fn request_rewrite(
    completion: &dyn TextCompletion,
    suggestion: &Suggestion,
    context: &RewriteContext,
    timeout: Duration,
) -> Result<Suggestion, ServiceError> {
    let prompt = build_rewrite_prompt(context);

    let text = match tokio::time::timeout(timeout, completion.complete(&prompt)).await {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            warn!("Rewrite for {} failed: {}", suggestion.id, e);
            return Err(e);
        }
        Err(_) => {
            warn!("Rewrite for {} timed out after {:?}", suggestion.id, timeout);
            return Err(ServiceError::Timeout(timeout));
        }
    };

    let text = text.trim();
    if text.is_empty() {
        return Err(ServiceError::EmptyContent);
    }

    info!("Rewrite for {} completed ({} chars)", suggestion.id, text.len());
    Ok(suggestion.with_replacement(text.to_string()))
}

/// A rewrite running on its own task.
pub struct PendingRewrite {
    handle: JoinHandle<Result<Suggestion, ServiceError>>,
}

impl PendingRewrite {
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Lets another owner (e.g. the session) cancel the task.
    pub fn abort_handle(&self) -> AbortHandle {
        self.handle.abort_handle()
    }

    pub async fn wait(self) -> Result<Suggestion, ServiceError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(ServiceError::Cancelled),
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        }
    }
}

pub fn spawn_rewrite(
    completion: Arc<dyn TextCompletion>,
    suggestion: Suggestion,
    context: RewriteContext,
    timeout: Duration,
) -> PendingRewrite {
    let handle = tokio::spawn(async move {
        request_rewrite(completion.as_ref(), &suggestion, &context, timeout).await
    });
    PendingRewrite { handle }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::models::fixtures::standard_document;
    use crate::models::{LocationRef, Severity, SuggestionCategory};

    /// Returns a fixed reply and records the prompts it saw.
    struct Canned {
        reply: Result<String, ()>,
        calls: AtomicUsize,
        last_prompt: std::sync::Mutex<String>,
    }

    impl Canned {
        fn ok(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
                last_prompt: std::sync::Mutex::new(String::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err(()),
                ..Self::ok("")
            }
        }
    }

    #[async_trait]
    impl TextCompletion for Canned {
        async fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = prompt.to_string();
            self.reply.clone().map_err(|_| ServiceError::Api {
                status: 500,
                message: "boom".to_string(),
            })
        }
    }

    /// Never answers within any reasonable timeout.
    struct Stalled;

    #[async_trait]
    impl TextCompletion for Stalled {
        async fn complete(&self, _prompt: &str) -> Result<String, ServiceError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("too late".to_string())
        }
    }

    fn keyword_suggestion(document: &ResumeDocument) -> Suggestion {
        let section = &document.sections[0];
        let entry = &section.entries[0];
        Suggestion {
            id: "keyword:aws".to_string(),
            category: SuggestionCategory::Keyword,
            severity: Severity::Info,
            location_ref: Some(LocationRef::block(
                section.id,
                entry.id,
                entry.blocks[0].id,
            )),
            message: "The job description mentions \"AWS\" but the resume does not.".to_string(),
            target: Some("AWS".to_string()),
            suggested_replacement_text: None,
        }
    }

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn test_context_collects_entry_and_neighbours() {
        let doc = standard_document(&["Built data pipelines", "Mentored two engineers"]);
        let context = RewriteContext::from_document(&doc, &keyword_suggestion(&doc)).unwrap();

        assert_eq!(context.section_heading, "Experience");
        assert_eq!(
            context.entry_heading.as_deref(),
            Some("Software Engineer, Analytical Engines Ltd")
        );
        assert_eq!(context.original.as_deref(), Some("Built data pipelines"));
        assert_eq!(context.neighbours, vec!["Mentored two engineers"]);
        assert_eq!(context.target.as_deref(), Some("AWS"));
    }

    #[test]
    fn test_context_for_document_level_suggestion() {
        let doc = standard_document(&["Built data pipelines"]);
        let mut suggestion = keyword_suggestion(&doc);
        suggestion.location_ref = None;
        let context = RewriteContext::from_document(&doc, &suggestion).unwrap();
        assert_eq!(context.original, None);
        assert_eq!(context.section_heading, "Resume");
    }

    #[test]
    fn test_dangling_location_is_validation_error() {
        let doc = standard_document(&["Built data pipelines"]);
        let mut suggestion = keyword_suggestion(&doc);
        suggestion.location_ref = Some(LocationRef::section(uuid::Uuid::new_v4()));
        assert!(matches!(
            RewriteContext::from_document(&doc, &suggestion),
            Err(ValidationError::DanglingLocation(_))
        ));
    }

    #[tokio::test]
    async fn test_rewrite_fills_replacement_only_on_copy() {
        let doc = standard_document(&["Built data pipelines"]);
        let suggestion = keyword_suggestion(&doc);
        let context = RewriteContext::from_document(&doc, &suggestion).unwrap();
        let llm = Canned::ok("  Built AWS data pipelines \n");

        let rewritten = request_rewrite(&llm, &suggestion, &context, TIMEOUT)
            .await
            .unwrap();

        assert_eq!(
            rewritten.suggested_replacement_text.as_deref(),
            Some("Built AWS data pipelines")
        );
        assert_eq!(suggestion.suggested_replacement_text, None);
        assert_eq!(rewritten.id, suggestion.id);

        let prompt = llm.last_prompt.lock().unwrap().clone();
        assert!(prompt.contains("Built data pipelines"));
        assert!(prompt.contains("Keyword to work in: AWS"));
    }

    #[tokio::test]
    async fn test_failure_is_single_attempt() {
        let doc = standard_document(&["Built data pipelines"]);
        let suggestion = keyword_suggestion(&doc);
        let context = RewriteContext::from_document(&doc, &suggestion).unwrap();
        let llm = Canned::failing();

        let result = request_rewrite(&llm, &suggestion, &context, TIMEOUT).await;
        assert!(matches!(result, Err(ServiceError::Api { status: 500, .. })));
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unconfigured_completion_is_unavailable() {
        let doc = standard_document(&["Built data pipelines"]);
        let suggestion = keyword_suggestion(&doc);
        let context = RewriteContext::from_document(&doc, &suggestion).unwrap();
        let result = request_rewrite(&UnconfiguredCompletion, &suggestion, &context, TIMEOUT).await;
        assert!(matches!(result, Err(ServiceError::Unavailable)));
    }

    #[tokio::test]
    async fn test_blank_reply_is_empty_content() {
        let doc = standard_document(&["Built data pipelines"]);
        let suggestion = keyword_suggestion(&doc);
        let context = RewriteContext::from_document(&doc, &suggestion).unwrap();
        let result = request_rewrite(&Canned::ok("   "), &suggestion, &context, TIMEOUT).await;
        assert!(matches!(result, Err(ServiceError::EmptyContent)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let doc = standard_document(&["Built data pipelines"]);
        let suggestion = keyword_suggestion(&doc);
        let context = RewriteContext::from_document(&doc, &suggestion).unwrap();

        let result = request_rewrite(&Stalled, &suggestion, &context, TIMEOUT).await;
        assert!(matches!(result, Err(ServiceError::Timeout(t)) if t == TIMEOUT));
    }

    #[tokio::test]
    async fn test_spawned_rewrite_completes() {
        let doc = standard_document(&["Built data pipelines"]);
        let suggestion = keyword_suggestion(&doc);
        let context = RewriteContext::from_document(&doc, &suggestion).unwrap();

        let pending = spawn_rewrite(
            Arc::new(Canned::ok("Built AWS data pipelines")),
            suggestion,
            context,
            TIMEOUT,
        );
        let rewritten = pending.wait().await.unwrap();
        assert_eq!(
            rewritten.suggested_replacement_text.as_deref(),
            Some("Built AWS data pipelines")
        );
    }

    #[tokio::test]
    async fn test_cancel_reports_cancelled() {
        let doc = standard_document(&["Built data pipelines"]);
        let suggestion = keyword_suggestion(&doc);
        let context = RewriteContext::from_document(&doc, &suggestion).unwrap();

        let pending = spawn_rewrite(Arc::new(Stalled), suggestion, context, TIMEOUT);
        pending.cancel();
        assert!(matches!(pending.wait().await, Err(ServiceError::Cancelled)));
    }

    #[tokio::test]
    async fn test_abort_handle_cancels() {
        let doc = standard_document(&["Built data pipelines"]);
        let suggestion = keyword_suggestion(&doc);
        let context = RewriteContext::from_document(&doc, &suggestion).unwrap();

        let pending = spawn_rewrite(Arc::new(Stalled), suggestion, context, TIMEOUT);
        pending.abort_handle().abort();
        assert!(matches!(pending.wait().await, Err(ServiceError::Cancelled)));
    }
}
