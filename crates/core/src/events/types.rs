use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::article::Article;

/// Events emitted after successful commits, consumed by SSE listeners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EditorEvent {
    Welcome,
    VersionCommitted(VersionCommitted),
    ArticleDeleted {
        #[serde(rename = "articleId")]
        article_id: Uuid,
    },
}

impl EditorEvent {
    /// The article this event concerns, if any.
    pub fn article_id(&self) -> Option<Uuid> {
        match self {
            EditorEvent::Welcome => None,
            EditorEvent::VersionCommitted(e) => Some(e.article_id),
            EditorEvent::ArticleDeleted { article_id } => Some(*article_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionCommitted {
    pub article_id: Uuid,
    pub version_number: u32,
    pub author: String,
    pub changes_summary: Option<String>,
    /// Set when the version was produced by a revert.
    pub reverted_from: Option<u32>,
    pub timestamp: DateTime<Utc>,
}

impl VersionCommitted {
    /// Describe the latest version of `article`.
    pub fn latest(article: &Article, reverted_from: Option<u32>) -> Self {
        let version = article.document().latest();
        Self {
            article_id: article.article_id(),
            version_number: version.version_number(),
            author: version.author().to_string(),
            changes_summary: version.changes_summary().map(str::to_string),
            reverted_from,
            timestamp: version.created_at(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::article::{ArticleCreate, ArticlePatch};

    #[test]
    fn committed_event_is_tagged_camel_case() {
        let mut article = Article::new(
            ArticleCreate {
                title: "T".into(),
                content: "A".into(),
                ..ArticleCreate::default()
            },
            "alice",
            Utc::now(),
        );
        article
            .apply_patch(ArticlePatch::content(1, "AB"), "bob", Utc::now())
            .unwrap();

        let event = EditorEvent::VersionCommitted(VersionCommitted::latest(&article, None));
        assert_eq!(event.article_id(), Some(article.article_id()));

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "versionCommitted");
        assert_eq!(json["versionNumber"], 2);
        assert_eq!(json["author"], "bob");
        assert_eq!(json["changesSummary"], "Version 2 update");
    }
}
