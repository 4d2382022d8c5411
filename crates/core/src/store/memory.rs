use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::{ArticleStore, ListFilter, StoreError, UpdateOutcome};
use crate::article::{validate_create, validate_patch, Article, ArticleCreate, ArticlePatch};
use crate::ledger::Version;

/// In-process store. Each article sits behind its own mutex, so commits to
/// one article are serialized while other articles stay writable.
#[derive(Debug, Default)]
pub struct MemoryStore {
    articles: RwLock<HashMap<Uuid, Arc<Mutex<Article>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn entry(&self, article_id: Uuid) -> Result<Arc<Mutex<Article>>, StoreError> {
        self.articles
            .read()
            .await
            .get(&article_id)
            .cloned()
            .ok_or(StoreError::NotFound(article_id))
    }
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn create(&self, input: ArticleCreate, author: &str) -> Result<Article, StoreError> {
        validate_create(&input)?;
        let article = Article::new(input, author, Utc::now());
        self.articles
            .write()
            .await
            .insert(article.article_id(), Arc::new(Mutex::new(article.clone())));
        tracing::info!(article_id = %article.article_id(), author, "article created");
        Ok(article)
    }

    async fn get(&self, article_id: Uuid) -> Result<Article, StoreError> {
        let entry = self.entry(article_id).await?;
        let article = entry.lock().await;
        Ok(article.clone())
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<Article>, StoreError> {
        let entries: Vec<_> = self.articles.read().await.values().cloned().collect();
        let mut articles = Vec::with_capacity(entries.len());
        for entry in entries {
            let article = entry.lock().await;
            if filter.status.map_or(true, |s| s == article.status) {
                articles.push(article.clone());
            }
        }
        articles.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(articles
            .into_iter()
            .skip(filter.skip)
            .take(filter.limit)
            .collect())
    }

    async fn update(
        &self,
        article_id: Uuid,
        patch: ArticlePatch,
        author: &str,
    ) -> Result<UpdateOutcome, StoreError> {
        validate_patch(&patch)?;
        let entry = self.entry(article_id).await?;
        let mut article = entry.lock().await;
        let committed = article.apply_patch(patch, author, Utc::now())?;
        if committed {
            tracing::info!(
                %article_id,
                version = article.current_version(),
                author,
                "article content committed"
            );
        }
        Ok(UpdateOutcome {
            article: article.clone(),
            committed,
        })
    }

    async fn delete(&self, article_id: Uuid) -> Result<(), StoreError> {
        if self.articles.write().await.remove(&article_id).is_none() {
            return Err(StoreError::NotFound(article_id));
        }
        tracing::info!(%article_id, "article deleted");
        Ok(())
    }

    async fn list_versions(&self, article_id: Uuid) -> Result<Vec<Version>, StoreError> {
        let entry = self.entry(article_id).await?;
        let article = entry.lock().await;
        Ok(article.versions().to_vec())
    }

    async fn get_version(&self, article_id: Uuid, number: u32) -> Result<Version, StoreError> {
        let entry = self.entry(article_id).await?;
        let article = entry.lock().await;
        Ok(article.document().require_version(number)?.clone())
    }

    async fn revert(
        &self,
        article_id: Uuid,
        number: u32,
        author: &str,
    ) -> Result<Article, StoreError> {
        let entry = self.entry(article_id).await?;
        let mut article = entry.lock().await;
        let version = article.revert(number, author, Utc::now())?.version_number();
        tracing::info!(%article_id, reverted_to = number, version, author, "article reverted");
        Ok(article.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::ArticleStatus;
    use crate::ledger::LedgerError;

    fn create_input(title: &str, content: &str) -> ArticleCreate {
        ArticleCreate {
            title: title.into(),
            content: content.into(),
            ..ArticleCreate::default()
        }
    }

    #[tokio::test]
    async fn commit_and_revert_history() {
        let store = MemoryStore::new();
        let article = store.create(create_input("T", "A"), "alice").await.unwrap();
        let id = article.article_id();

        store.update(id, ArticlePatch::content(1, "AB"), "alice").await.unwrap();
        store.update(id, ArticlePatch::content(2, "ABC"), "alice").await.unwrap();
        let reverted = store.revert(id, 1, "alice").await.unwrap();

        assert_eq!(reverted.current_version(), 4);
        assert_eq!(reverted.content(), "A");

        let history = store.list_versions(id).await.unwrap();
        let contents: Vec<_> = history.iter().map(|v| v.content().to_string()).collect();
        assert_eq!(contents, vec!["A", "AB", "ABC", "A"]);

        let v4 = store.get_version(id, 4).await.unwrap();
        let v1 = store.get_version(id, 1).await.unwrap();
        assert_eq!(v4.content(), v1.content());
    }

    #[tokio::test]
    async fn missing_version_is_reported() {
        let store = MemoryStore::new();
        let id = store.create(create_input("T", "A"), "alice").await.unwrap().article_id();

        let err = store.get_version(id, 2).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Ledger(LedgerError::VersionNotFound { requested: 2, latest: 1 })
        ));
        let err = store.revert(id, 0, "alice").await.unwrap_err();
        assert!(matches!(err, StoreError::Ledger(LedgerError::VersionNotFound { .. })));
    }

    #[tokio::test]
    async fn update_reports_whether_it_committed() {
        let store = MemoryStore::new();
        let id = store.create(create_input("T", "A"), "alice").await.unwrap().article_id();

        let outcome = store.update(id, ArticlePatch::content(1, "AB"), "alice").await.unwrap();
        assert!(outcome.committed);
        assert_eq!(outcome.article.current_version(), 2);

        let mut resend = ArticlePatch::content(1, "AB");
        resend.title = Some("Renamed".into());
        let outcome = store.update(id, resend, "alice").await.unwrap();
        assert!(!outcome.committed);
        assert_eq!(outcome.article.current_version(), 2);
        assert_eq!(outcome.article.title, "Renamed");
    }

    #[tokio::test]
    async fn content_without_base_is_rejected() {
        let store = MemoryStore::new();
        let id = store.create(create_input("T", "A"), "alice").await.unwrap().article_id();
        let patch = ArticlePatch {
            content: Some("B".into()),
            ..ArticlePatch::default()
        };
        assert!(matches!(
            store.update(id, patch, "alice").await,
            Err(StoreError::Validation(_))
        ));
        assert_eq!(store.get(id).await.unwrap().current_version(), 1);
    }

    #[tokio::test]
    async fn list_filters_and_paginates() {
        let store = MemoryStore::new();
        for i in 0..3 {
            store
                .create(create_input(&format!("Paper {i}"), ""), "alice")
                .await
                .unwrap();
        }
        let last = store.create(create_input("Submitted", ""), "alice").await.unwrap();
        let patch = ArticlePatch {
            status: Some(ArticleStatus::Submitted),
            ..ArticlePatch::default()
        };
        store.update(last.article_id(), patch, "alice").await.unwrap();

        let submitted = store
            .list(&ListFilter {
                status: Some(ArticleStatus::Submitted),
                ..ListFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].title, "Submitted");

        let page = store
            .list(&ListFilter {
                skip: 1,
                limit: 2,
                ..ListFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
    }

    #[tokio::test]
    async fn delete_removes_history() {
        let store = MemoryStore::new();
        let id = store.create(create_input("T", "A"), "alice").await.unwrap().article_id();
        store.delete(id).await.unwrap();

        assert!(matches!(store.get(id).await, Err(StoreError::NotFound(_))));
        assert!(matches!(store.list_versions(id).await, Err(StoreError::NotFound(_))));
        assert!(matches!(store.delete(id).await, Err(StoreError::NotFound(_))));
    }
}
