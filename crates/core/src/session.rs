//! Client-side editing loop over one article.
//!
//! An [`EditorSession`] keeps the last saved article, a working draft and the
//! pending suggestions for that draft. Suggestions are applied to the draft
//! only; [`EditorSession::save`] commits the draft on top of the version it
//! was loaded from.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::article::{Article, ArticlePatch};
use crate::patch::{BatchOutcome, PendingSuggestions, SuggestionId};
use crate::services::{fetch_suggestions, AnalysisService};
use crate::store::{ArticleStore, StoreError};

pub struct EditorSession {
    store: Arc<dyn ArticleStore>,
    article: Article,
    draft: String,
    pending: PendingSuggestions,
}

impl EditorSession {
    pub async fn open(store: Arc<dyn ArticleStore>, article_id: Uuid) -> Result<Self, StoreError> {
        let article = store.get(article_id).await?;
        Ok(Self {
            store,
            draft: article.content().to_string(),
            article,
            pending: PendingSuggestions::new(),
        })
    }

    /// The article as of the last load, save or revert.
    pub fn article(&self) -> &Article {
        &self.article
    }

    /// Working draft, including unsaved edits.
    pub fn content(&self) -> &str {
        &self.draft
    }

    /// Version the draft is based on.
    pub fn base_version(&self) -> u32 {
        self.article.current_version()
    }

    pub fn is_dirty(&self) -> bool {
        self.draft != self.article.content()
    }

    pub fn pending(&self) -> &PendingSuggestions {
        &self.pending
    }

    /// Replace the draft with freely typed text.
    ///
    /// Pending suggestions are kept; any whose anchored text no longer matches
    /// will be rejected as stale when applied.
    pub fn edit(&mut self, content: impl Into<String>) {
        self.draft = content.into();
    }

    /// Replace the pending set with fresh suggestions for the current draft.
    pub async fn refresh_suggestions(
        &mut self,
        service: &dyn AnalysisService,
        timeout: Duration,
    ) -> Vec<SuggestionId> {
        let batch =
            fetch_suggestions(service, &self.draft, self.article.template, timeout).await;
        self.pending.clear();
        self.pending.extend(batch.suggestions)
    }

    /// Apply the selected suggestions to the draft.
    pub fn apply_suggestions(&mut self, ids: &[SuggestionId]) -> BatchOutcome {
        let outcome = self.pending.apply_batch(&self.draft, ids);
        self.draft.clone_from(&outcome.content);
        outcome
    }

    pub fn dismiss(&mut self, id: SuggestionId) -> bool {
        self.pending.dismiss(id).is_some()
    }

    /// Commit the draft as a new version. Returns `false` if there was
    /// nothing to commit.
    ///
    /// If another writer committed first the store reports a conflict and the
    /// draft is kept, so the caller can [`reload`](Self::reload) and redo it.
    pub async fn save(
        &mut self,
        author: &str,
        summary: Option<String>,
    ) -> Result<bool, StoreError> {
        if !self.is_dirty() {
            return Ok(false);
        }
        let mut patch = ArticlePatch::content(self.base_version(), self.draft.clone());
        patch.changes_summary = summary;

        let article = self
            .store
            .update(self.article.article_id(), patch, author)
            .await?
            .article;
        tracing::debug!(
            article_id = %article.article_id(),
            version = article.current_version(),
            "session saved"
        );
        self.article = article;
        Ok(true)
    }

    /// Revert the article to version `number`, discarding the draft.
    pub async fn revert(&mut self, number: u32, author: &str) -> Result<(), StoreError> {
        let article = self
            .store
            .revert(self.article.article_id(), number, author)
            .await?;
        self.reset(article);
        Ok(())
    }

    /// Reload the latest article, discarding the draft and pending suggestions.
    pub async fn reload(&mut self) -> Result<(), StoreError> {
        let article = self.store.get(self.article.article_id()).await?;
        self.reset(article);
        Ok(())
    }

    fn reset(&mut self, article: Article) {
        self.draft = article.content().to_string();
        self.article = article;
        self.pending.clear();
    }
}
