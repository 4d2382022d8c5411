//! Article persistence boundary.
//!
//! Every mutation of an article's content goes through [`ArticleStore::update`]
//! or [`ArticleStore::revert`], which route into the version ledger while
//! holding the article's write lock.

mod memory;
mod postgres;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::article::{Article, ArticleCreate, ArticlePatch, ArticleStatus, ValidationError};
use crate::ledger::{LedgerError, Version};

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub const DEFAULT_LIST_LIMIT: usize = 100;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("article not found: {0}")]
    NotFound(Uuid),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Whether reloading the article and retrying can succeed.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StoreError::Ledger(LedgerError::ConcurrentModification { .. })
        )
    }
}

/// Filter for [`ArticleStore::list`]; results are newest `updated_at` first.
#[derive(Debug, Clone, Deserialize)]
pub struct ListFilter {
    #[serde(default)]
    pub status: Option<ArticleStatus>,
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_LIST_LIMIT
}

impl Default for ListFilter {
    fn default() -> Self {
        Self {
            status: None,
            skip: 0,
            limit: DEFAULT_LIST_LIMIT,
        }
    }
}

/// Result of [`ArticleStore::update`].
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub article: Article,
    /// Whether the patch committed a new version.
    pub committed: bool,
}

#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn create(&self, input: ArticleCreate, author: &str) -> Result<Article, StoreError>;

    async fn get(&self, article_id: Uuid) -> Result<Article, StoreError>;

    async fn list(&self, filter: &ListFilter) -> Result<Vec<Article>, StoreError>;

    /// Apply `patch`, committing a new version if the content changed.
    async fn update(
        &self,
        article_id: Uuid,
        patch: ArticlePatch,
        author: &str,
    ) -> Result<UpdateOutcome, StoreError>;

    /// Delete the article together with its whole history.
    async fn delete(&self, article_id: Uuid) -> Result<(), StoreError>;

    /// Version history, oldest first.
    async fn list_versions(&self, article_id: Uuid) -> Result<Vec<Version>, StoreError>;

    async fn get_version(&self, article_id: Uuid, number: u32) -> Result<Version, StoreError>;

    /// Commit a copy of version `number` as the article's newest version.
    async fn revert(&self, article_id: Uuid, number: u32, author: &str)
        -> Result<Article, StoreError>;

    /// Cheap liveness check of the backing storage.
    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
