use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::{LedgerError, Version, VersionedDocument};

/// Lifecycle status of an article.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleStatus {
    #[default]
    Draft,
    InReview,
    Revised,
    Submitted,
    Published,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Draft => "draft",
            ArticleStatus::InReview => "in_review",
            ArticleStatus::Revised => "revised",
            ArticleStatus::Submitted => "submitted",
            ArticleStatus::Published => "published",
        }
    }
}

impl fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArticleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ArticleStatus::Draft),
            "in_review" => Ok(ArticleStatus::InReview),
            "revised" => Ok(ArticleStatus::Revised),
            "submitted" => Ok(ArticleStatus::Submitted),
            "published" => Ok(ArticleStatus::Published),
            other => Err(format!("unknown article status: {other}")),
        }
    }
}

/// Publisher template the manuscript is formatted for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Template {
    #[serde(rename = "IEEE")]
    Ieee,
    Elsevier,
    #[serde(rename = "ACM")]
    Acm,
    Springer,
    Nature,
    Science,
    #[default]
    Generic,
}

impl Template {
    pub fn as_str(&self) -> &'static str {
        match self {
            Template::Ieee => "IEEE",
            Template::Elsevier => "Elsevier",
            Template::Acm => "ACM",
            Template::Springer => "Springer",
            Template::Nature => "Nature",
            Template::Science => "Science",
            Template::Generic => "Generic",
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Template {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IEEE" => Ok(Template::Ieee),
            "Elsevier" => Ok(Template::Elsevier),
            "ACM" => Ok(Template::Acm),
            "Springer" => Ok(Template::Springer),
            "Nature" => Ok(Template::Nature),
            "Science" => Ok(Template::Science),
            "Generic" => Ok(Template::Generic),
            other => Err(format!("unknown template: {other}")),
        }
    }
}

/// An academic article: metadata plus its versioned content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    #[serde(rename = "abstract", default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    pub status: ArticleStatus,
    pub template: Template,
    pub authors: Vec<String>,
    pub keywords: Vec<String>,
    pub references: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    /// Content and history; only reachable through `apply_patch` and `revert`.
    #[serde(flatten)]
    document: VersionedDocument,
}

/// Input for creating an article.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleCreate {
    pub title: String,
    #[serde(rename = "abstract", default)]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub template: Template,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Partial update of an article.
///
/// A content change must name the version it was edited from in
/// `base_version`; it is rejected if the article has moved on since.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticlePatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "abstract", default)]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub base_version: Option<u32>,
    #[serde(default)]
    pub status: Option<ArticleStatus>,
    #[serde(default)]
    pub template: Option<Template>,
    #[serde(default)]
    pub authors: Option<Vec<String>>,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    #[serde(default)]
    pub references: Option<Vec<String>>,
    #[serde(default)]
    pub changes_summary: Option<String>,
}

impl ArticlePatch {
    /// Patch that only replaces the content.
    pub fn content(base_version: u32, content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            base_version: Some(base_version),
            ..Self::default()
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.changes_summary = Some(summary.into());
        self
    }
}

impl Article {
    pub fn new(input: ArticleCreate, author: &str, now: DateTime<Utc>) -> Self {
        let article_id = Uuid::new_v4();
        let authors = if input.authors.is_empty() {
            vec![author.to_string()]
        } else {
            input.authors
        };
        Self {
            title: input.title,
            abstract_text: input.abstract_text,
            status: ArticleStatus::Draft,
            template: input.template,
            authors,
            keywords: input.keywords,
            references: Vec::new(),
            created_at: now,
            updated_at: now,
            submitted_at: None,
            published_at: None,
            document: VersionedDocument::create(article_id, input.content, author),
        }
    }

    /// Reassemble an article loaded from storage.
    pub(crate) fn from_parts(metadata: ArticleMetadata, document: VersionedDocument) -> Self {
        Self {
            title: metadata.title,
            abstract_text: metadata.abstract_text,
            status: metadata.status,
            template: metadata.template,
            authors: metadata.authors,
            keywords: metadata.keywords,
            references: metadata.references,
            created_at: metadata.created_at,
            updated_at: metadata.updated_at,
            submitted_at: metadata.submitted_at,
            published_at: metadata.published_at,
            document,
        }
    }

    pub fn article_id(&self) -> Uuid {
        self.document.article_id()
    }

    pub fn content(&self) -> &str {
        self.document.content()
    }

    pub fn current_version(&self) -> u32 {
        self.document.current_version()
    }

    pub fn document(&self) -> &VersionedDocument {
        &self.document
    }

    pub fn versions(&self) -> &[Version] {
        self.document.history()
    }

    /// Apply a validated patch. Returns `true` if a new version was committed.
    ///
    /// Validation guarantees a content change carries `base_version`.
    /// The content commit runs first so a rejected commit leaves the
    /// metadata untouched as well.
    pub fn apply_patch(
        &mut self,
        patch: ArticlePatch,
        author: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, LedgerError> {
        let mut committed = false;
        if let Some(content) = patch.content {
            if content != self.content() {
                let base = patch.base_version.unwrap_or_else(|| self.current_version());
                let next = self.current_version().saturating_add(1);
                let summary = patch
                    .changes_summary
                    .unwrap_or_else(|| format!("Version {next} update"));
                self.document.commit(base, content, author, Some(summary))?;
                committed = true;
            }
        }

        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(abstract_text) = patch.abstract_text {
            self.abstract_text = Some(abstract_text);
        }
        if let Some(template) = patch.template {
            self.template = template;
        }
        if let Some(authors) = patch.authors {
            self.authors = authors;
        }
        if let Some(keywords) = patch.keywords {
            self.keywords = keywords;
        }
        if let Some(references) = patch.references {
            self.references = references;
        }
        if let Some(status) = patch.status {
            self.set_status(status, now);
        }
        self.updated_at = now;
        Ok(committed)
    }

    /// Commit a copy of version `target` as the newest version.
    pub fn revert(
        &mut self,
        target: u32,
        author: &str,
        now: DateTime<Utc>,
    ) -> Result<&Version, LedgerError> {
        self.document.revert(target, author)?;
        self.updated_at = now;
        Ok(self.document.latest())
    }

    fn set_status(&mut self, status: ArticleStatus, now: DateTime<Utc>) {
        self.status = status;
        match status {
            ArticleStatus::Submitted if self.submitted_at.is_none() => {
                self.submitted_at = Some(now);
            }
            ArticleStatus::Published if self.published_at.is_none() => {
                self.published_at = Some(now);
            }
            _ => {}
        }
    }
}

/// Article fields stored alongside, but separately from, the version history.
#[derive(Debug, Clone)]
pub(crate) struct ArticleMetadata {
    pub title: String,
    pub abstract_text: Option<String>,
    pub status: ArticleStatus,
    pub template: Template,
    pub authors: Vec<String>,
    pub keywords: Vec<String>,
    pub references: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(content: &str) -> Article {
        Article::new(
            ArticleCreate {
                title: "On Offsets".into(),
                content: content.into(),
                ..ArticleCreate::default()
            },
            "alice",
            Utc::now(),
        )
    }

    #[test]
    fn creator_becomes_default_author() {
        let a = article("A");
        assert_eq!(a.authors, vec!["alice".to_string()]);
        assert_eq!(a.current_version(), 1);
        assert_eq!(a.status, ArticleStatus::Draft);
    }

    #[test]
    fn unchanged_content_does_not_commit() {
        let mut a = article("A");
        let patch = ArticlePatch {
            content: Some("A".into()),
            base_version: Some(1),
            title: Some("Renamed".into()),
            ..ArticlePatch::default()
        };
        assert!(!a.apply_patch(patch, "alice", Utc::now()).unwrap());
        assert_eq!(a.current_version(), 1);
        assert_eq!(a.title, "Renamed");
    }

    #[test]
    fn content_change_uses_default_summary() {
        let mut a = article("A");
        assert!(a
            .apply_patch(ArticlePatch::content(1, "AB"), "bob", Utc::now())
            .unwrap());
        assert_eq!(a.current_version(), 2);
        assert_eq!(a.document().latest().changes_summary(), Some("Version 2 update"));
        assert_eq!(a.document().latest().author(), "bob");
    }

    #[test]
    fn rejected_commit_leaves_metadata_alone() {
        let mut a = article("A");
        a.apply_patch(ArticlePatch::content(1, "AB"), "alice", Utc::now())
            .unwrap();

        let mut stale = ArticlePatch::content(1, "AX");
        stale.title = Some("Should not stick".into());
        let err = a.apply_patch(stale, "bob", Utc::now()).unwrap_err();

        assert!(matches!(err, LedgerError::ConcurrentModification { .. }));
        assert_eq!(a.title, "On Offsets");
        assert_eq!(a.content(), "AB");
    }

    #[test]
    fn out_of_range_base_is_a_conflict() {
        let mut a = article("A");
        let err = a
            .apply_patch(ArticlePatch::content(u32::MAX, "B"), "bob", Utc::now())
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::ConcurrentModification {
                expected: u32::MAX,
                actual: 1
            }
        ));
        assert_eq!(a.content(), "A");
    }

    #[test]
    fn submission_timestamp_set_once() {
        let mut a = article("A");
        let first = Utc::now();
        let patch = ArticlePatch {
            status: Some(ArticleStatus::Submitted),
            ..ArticlePatch::default()
        };
        a.apply_patch(patch.clone(), "alice", first).unwrap();
        a.apply_patch(patch, "alice", first + chrono::Duration::hours(1))
            .unwrap();
        assert_eq!(a.submitted_at, Some(first));
        assert!(a.published_at.is_none());
    }

    #[test]
    fn serializes_flat_document_fields() {
        let a = article("Hello");
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["content"], "Hello");
        assert_eq!(json["current_version"], 1);
        assert_eq!(json["template"], "Generic");
        assert_eq!(json["status"], "draft");
        assert_eq!(json["article_id"], a.article_id().to_string());
        assert_eq!(json["versions"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn template_names_roundtrip() {
        for name in ["IEEE", "Elsevier", "ACM", "Springer", "Nature", "Science", "Generic"] {
            let t: Template = name.parse().unwrap();
            assert_eq!(t.as_str(), name);
            assert_eq!(serde_json::to_value(t).unwrap(), name);
        }
    }
}
