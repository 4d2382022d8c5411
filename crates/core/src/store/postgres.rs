//! PostgreSQL-backed article store.
//!
//! Writes lock the article row with `SELECT ... FOR UPDATE`, rebuild the
//! ledger from `article_versions`, commit in memory and persist the new
//! version inside the same transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::{ArticleStore, ListFilter, StoreError, UpdateOutcome};
use crate::article::{
    validate_create, validate_patch, Article, ArticleCreate, ArticleMetadata, ArticlePatch,
};
use crate::ledger::{Version, VersionedDocument};

const ARTICLE_COLUMNS: &str = "article_id, title, abstract, status, template, authors, keywords, \
     references_list, created_at, updated_at, submitted_at, published_at";

const VERSION_COLUMNS: &str =
    "version_id, version_number, content, author, changes_summary, created_at";

/// Database row of the `articles` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ArticleRow {
    article_id: Uuid,
    title: String,
    #[sqlx(rename = "abstract")]
    abstract_text: Option<String>,
    status: String,
    template: String,
    authors: Vec<String>,
    keywords: Vec<String>,
    references_list: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    submitted_at: Option<DateTime<Utc>>,
    published_at: Option<DateTime<Utc>>,
}

/// Database row of the `article_versions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct VersionRow {
    version_id: Uuid,
    version_number: i32,
    content: String,
    author: String,
    changes_summary: Option<String>,
    created_at: DateTime<Utc>,
}

impl VersionRow {
    fn into_version(self) -> Result<Version, StoreError> {
        let number = u32::try_from(self.version_number).map_err(|_| {
            StoreError::Corrupt(format!("negative version number {}", self.version_number))
        })?;
        Ok(Version::restore(
            self.version_id,
            number,
            self.content,
            self.created_at,
            self.author,
            self.changes_summary,
        ))
    }
}

impl ArticleRow {
    fn into_article(self, versions: Vec<VersionRow>) -> Result<Article, StoreError> {
        let versions = versions
            .into_iter()
            .map(VersionRow::into_version)
            .collect::<Result<Vec<_>, _>>()?;
        let document = VersionedDocument::from_history(self.article_id, versions)?;
        let metadata = ArticleMetadata {
            title: self.title,
            abstract_text: self.abstract_text,
            status: self.status.parse().map_err(StoreError::Corrupt)?,
            template: self.template.parse().map_err(StoreError::Corrupt)?,
            authors: self.authors,
            keywords: self.keywords,
            references: self.references_list,
            created_at: self.created_at,
            updated_at: self.updated_at,
            submitted_at: self.submitted_at,
            published_at: self.published_at,
        };
        Ok(Article::from_parts(metadata, document))
    }
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_row(
        conn: &mut PgConnection,
        article_id: Uuid,
        for_update: bool,
    ) -> Result<ArticleRow, StoreError> {
        let lock = if for_update { " FOR UPDATE" } else { "" };
        let query = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE article_id = $1{lock}");
        sqlx::query_as::<_, ArticleRow>(&query)
            .bind(article_id)
            .fetch_optional(conn)
            .await?
            .ok_or(StoreError::NotFound(article_id))
    }

    async fn fetch_versions(
        conn: &mut PgConnection,
        article_id: Uuid,
    ) -> Result<Vec<VersionRow>, StoreError> {
        let query = format!(
            "SELECT {VERSION_COLUMNS} FROM article_versions
             WHERE article_id = $1
             ORDER BY version_number ASC"
        );
        Ok(sqlx::query_as::<_, VersionRow>(&query)
            .bind(article_id)
            .fetch_all(conn)
            .await?)
    }

    async fn load(
        conn: &mut PgConnection,
        article_id: Uuid,
        for_update: bool,
    ) -> Result<Article, StoreError> {
        let row = Self::fetch_row(&mut *conn, article_id, for_update).await?;
        let versions = Self::fetch_versions(&mut *conn, article_id).await?;
        row.into_article(versions)
    }

    async fn insert_version(
        conn: &mut PgConnection,
        article_id: Uuid,
        version: &Version,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO article_versions
                (version_id, article_id, version_number, content, author, changes_summary, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(version.version_id())
        .bind(article_id)
        .bind(version.version_number() as i32)
        .bind(version.content())
        .bind(version.author())
        .bind(version.changes_summary())
        .bind(version.created_at())
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn save_metadata(conn: &mut PgConnection, article: &Article) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE articles SET
                title = $2, abstract = $3, status = $4, template = $5, authors = $6,
                keywords = $7, references_list = $8, current_version = $9,
                updated_at = $10, submitted_at = $11, published_at = $12
             WHERE article_id = $1",
        )
        .bind(article.article_id())
        .bind(&article.title)
        .bind(&article.abstract_text)
        .bind(article.status.as_str())
        .bind(article.template.as_str())
        .bind(&article.authors)
        .bind(&article.keywords)
        .bind(&article.references)
        .bind(article.current_version() as i32)
        .bind(article.updated_at)
        .bind(article.submitted_at)
        .bind(article.published_at)
        .execute(conn)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ArticleStore for PgStore {
    async fn create(&self, input: ArticleCreate, author: &str) -> Result<Article, StoreError> {
        validate_create(&input)?;
        let article = Article::new(input, author, Utc::now());

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO articles
                (article_id, title, abstract, status, template, authors, keywords,
                 references_list, current_version, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(article.article_id())
        .bind(&article.title)
        .bind(&article.abstract_text)
        .bind(article.status.as_str())
        .bind(article.template.as_str())
        .bind(&article.authors)
        .bind(&article.keywords)
        .bind(&article.references)
        .bind(article.current_version() as i32)
        .bind(article.created_at)
        .bind(article.updated_at)
        .execute(&mut *tx)
        .await?;
        Self::insert_version(&mut tx, article.article_id(), article.document().latest()).await?;
        tx.commit().await?;

        tracing::info!(article_id = %article.article_id(), author, "article created");
        Ok(article)
    }

    async fn get(&self, article_id: Uuid) -> Result<Article, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Self::load(&mut conn, article_id, false).await
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<Article>, StoreError> {
        let query = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles
             WHERE ($1::TEXT IS NULL OR status = $1)
             ORDER BY updated_at DESC
             OFFSET $2 LIMIT $3"
        );
        // Values past i64::MAX are clamped; the result is the same empty page.
        let skip = i64::try_from(filter.skip).unwrap_or(i64::MAX);
        let limit = i64::try_from(filter.limit).unwrap_or(i64::MAX);
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query_as::<_, ArticleRow>(&query)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(skip)
            .bind(limit)
            .fetch_all(&mut *conn)
            .await?;

        let mut articles = Vec::with_capacity(rows.len());
        for row in rows {
            let versions = Self::fetch_versions(&mut conn, row.article_id).await?;
            articles.push(row.into_article(versions)?);
        }
        Ok(articles)
    }

    async fn update(
        &self,
        article_id: Uuid,
        patch: ArticlePatch,
        author: &str,
    ) -> Result<UpdateOutcome, StoreError> {
        validate_patch(&patch)?;
        let mut tx = self.pool.begin().await?;
        let mut article = Self::load(&mut tx, article_id, true).await?;
        let committed = article.apply_patch(patch, author, Utc::now())?;
        if committed {
            Self::insert_version(&mut tx, article_id, article.document().latest()).await?;
        }
        Self::save_metadata(&mut tx, &article).await?;
        tx.commit().await?;

        tracing::info!(
            %article_id,
            version = article.current_version(),
            committed,
            author,
            "article updated"
        );
        Ok(UpdateOutcome { article, committed })
    }

    async fn delete(&self, article_id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM articles WHERE article_id = $1")
            .bind(article_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(article_id));
        }
        tracing::info!(%article_id, "article deleted");
        Ok(())
    }

    async fn list_versions(&self, article_id: Uuid) -> Result<Vec<Version>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_row(&mut conn, article_id, false).await?;
        Self::fetch_versions(&mut conn, article_id)
            .await?
            .into_iter()
            .map(VersionRow::into_version)
            .collect()
    }

    async fn get_version(&self, article_id: Uuid, number: u32) -> Result<Version, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let article = Self::load(&mut conn, article_id, false).await?;
        Ok(article.document().require_version(number)?.clone())
    }

    async fn revert(
        &self,
        article_id: Uuid,
        number: u32,
        author: &str,
    ) -> Result<Article, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut article = Self::load(&mut tx, article_id, true).await?;
        article.revert(number, author, Utc::now())?;
        Self::insert_version(&mut tx, article_id, article.document().latest()).await?;
        Self::save_metadata(&mut tx, &article).await?;
        tx.commit().await?;

        tracing::info!(
            %article_id,
            reverted_to = number,
            version = article.current_version(),
            author,
            "article reverted"
        );
        Ok(article)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
