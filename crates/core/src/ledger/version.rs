use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable full-content snapshot of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    version_id: Uuid,
    version_number: u32,
    content: String,
    created_at: DateTime<Utc>,
    author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    changes_summary: Option<String>,
}

impl Version {
    pub(crate) fn new(
        version_number: u32,
        content: String,
        author: &str,
        changes_summary: Option<String>,
    ) -> Self {
        Self {
            version_id: Uuid::now_v7(),
            version_number,
            content,
            created_at: Utc::now(),
            author: author.to_string(),
            changes_summary,
        }
    }

    /// Rebuild a version read back from storage.
    pub(crate) fn restore(
        version_id: Uuid,
        version_number: u32,
        content: String,
        created_at: DateTime<Utc>,
        author: String,
        changes_summary: Option<String>,
    ) -> Self {
        Self {
            version_id,
            version_number,
            content,
            created_at,
            author,
            changes_summary,
        }
    }

    pub fn version_id(&self) -> Uuid {
        self.version_id
    }

    pub fn version_number(&self) -> u32 {
        self.version_number
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn changes_summary(&self) -> Option<&str> {
        self.changes_summary.as_deref()
    }
}
