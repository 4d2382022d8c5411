use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use super::{LedgerError, Version, INITIAL_SUMMARY};

/// A document together with its complete version history.
///
/// `current_version` is the number of the last version and `content` is that
/// version's content. Both are derived from the history, so they cannot drift
/// apart from it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "DocumentRepr")]
pub struct VersionedDocument {
    article_id: Uuid,
    /// Never empty; `versions[i].version_number == i + 1`.
    versions: Vec<Version>,
}

impl VersionedDocument {
    /// Start a history with version 1 holding `content`.
    pub fn create(article_id: Uuid, content: impl Into<String>, author: &str) -> Self {
        let initial = Version::new(1, content.into(), author, Some(INITIAL_SUMMARY.to_string()));
        Self {
            article_id,
            versions: vec![initial],
        }
    }

    /// Rebuild a document from a stored history, oldest first.
    pub fn from_history(article_id: Uuid, versions: Vec<Version>) -> Result<Self, LedgerError> {
        if versions.is_empty() {
            return Err(LedgerError::InvalidHistory(format!(
                "article {article_id} has no versions"
            )));
        }
        for (index, version) in versions.iter().enumerate() {
            let expected = index as u32 + 1;
            if version.version_number() != expected {
                return Err(LedgerError::InvalidHistory(format!(
                    "article {article_id}: expected version {expected}, found {}",
                    version.version_number()
                )));
            }
        }
        Ok(Self {
            article_id,
            versions,
        })
    }

    pub fn article_id(&self) -> Uuid {
        self.article_id
    }

    pub fn current_version(&self) -> u32 {
        self.versions.len() as u32
    }

    pub fn content(&self) -> &str {
        self.latest().content()
    }

    pub fn latest(&self) -> &Version {
        // `versions` is never empty; see `create` and `from_history`.
        &self.versions[self.versions.len() - 1]
    }

    /// All versions, oldest first.
    pub fn history(&self) -> &[Version] {
        &self.versions
    }

    pub fn version(&self, number: u32) -> Option<&Version> {
        let index = (number as usize).checked_sub(1)?;
        self.versions.get(index)
    }

    /// Look up a version, failing with [`LedgerError::VersionNotFound`].
    pub fn require_version(&self, number: u32) -> Result<&Version, LedgerError> {
        self.version(number).ok_or(LedgerError::VersionNotFound {
            requested: number,
            latest: self.current_version(),
        })
    }

    /// Append a new version built on top of `base_version`.
    ///
    /// Fails with [`LedgerError::ConcurrentModification`] if another commit
    /// landed after `base_version`; the caller reloads and retries.
    pub fn commit(
        &mut self,
        base_version: u32,
        content: impl Into<String>,
        author: &str,
        changes_summary: Option<String>,
    ) -> Result<&Version, LedgerError> {
        let actual = self.current_version();
        if base_version != actual {
            return Err(LedgerError::ConcurrentModification {
                expected: base_version,
                actual,
            });
        }

        let number = actual + 1;
        self.versions
            .push(Version::new(number, content.into(), author, changes_summary));
        tracing::debug!(
            article_id = %self.article_id,
            version = number,
            author,
            "committed version"
        );
        Ok(self.latest())
    }

    /// Append a new version whose content copies version `target`.
    pub fn revert(&mut self, target: u32, author: &str) -> Result<&Version, LedgerError> {
        let content = self.require_version(target)?.content().to_string();
        let base = self.current_version();
        self.commit(
            base,
            content,
            author,
            Some(format!("Reverted to version {target}")),
        )
    }
}

impl Serialize for VersionedDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("VersionedDocument", 4)?;
        state.serialize_field("article_id", &self.article_id)?;
        state.serialize_field("content", self.content())?;
        state.serialize_field("current_version", &self.current_version())?;
        state.serialize_field("versions", &self.versions)?;
        state.end()
    }
}

#[derive(Deserialize)]
struct DocumentRepr {
    article_id: Uuid,
    content: String,
    current_version: u32,
    versions: Vec<Version>,
}

impl TryFrom<DocumentRepr> for VersionedDocument {
    type Error = LedgerError;

    fn try_from(repr: DocumentRepr) -> Result<Self, Self::Error> {
        let doc = VersionedDocument::from_history(repr.article_id, repr.versions)?;
        if doc.current_version() != repr.current_version || doc.content() != repr.content {
            return Err(LedgerError::InvalidHistory(
                "current_version or content disagrees with history".to_string(),
            ));
        }
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(content: &str) -> VersionedDocument {
        VersionedDocument::create(Uuid::new_v4(), content, "alice")
    }

    #[test]
    fn create_starts_at_version_one() {
        let d = doc("A");
        assert_eq!(d.current_version(), 1);
        assert_eq!(d.content(), "A");
        assert_eq!(d.history().len(), 1);
        assert_eq!(d.latest().changes_summary(), Some(INITIAL_SUMMARY));
    }

    #[test]
    fn commit_then_revert_appends() {
        let mut d = doc("A");
        d.commit(1, "AB", "alice", None).unwrap();
        d.commit(2, "ABC", "alice", None).unwrap();

        let reverted = d.revert(1, "bob").unwrap();
        assert_eq!(reverted.version_number(), 4);
        assert_eq!(reverted.content(), "A");
        assert_eq!(reverted.author(), "bob");
        assert_eq!(reverted.changes_summary(), Some("Reverted to version 1"));

        assert_eq!(d.current_version(), 4);
        assert_eq!(d.content(), "A");
        let contents: Vec<_> = d.history().iter().map(|v| v.content()).collect();
        assert_eq!(contents, vec!["A", "AB", "ABC", "A"]);
    }

    #[test]
    fn revert_leaves_target_untouched() {
        let mut d = doc("first draft");
        d.commit(1, "second draft", "alice", None).unwrap();
        let before = d.version(1).unwrap().clone();

        d.revert(1, "alice").unwrap();

        assert_eq!(d.version(1).unwrap(), &before);
        assert_eq!(d.latest().content(), before.content());
        assert_ne!(d.latest().version_id(), before.version_id());
    }

    #[test]
    fn stale_base_is_rejected() {
        let mut d = doc("A");
        d.commit(1, "AB", "alice", None).unwrap();

        let err = d.commit(1, "AX", "bob", None).unwrap_err();
        assert_eq!(
            err,
            LedgerError::ConcurrentModification {
                expected: 1,
                actual: 2
            }
        );
        assert_eq!(d.current_version(), 2);
        assert_eq!(d.content(), "AB");
    }

    #[test]
    fn revert_outside_range_fails() {
        let mut d = doc("A");
        d.commit(1, "AB", "alice", None).unwrap();

        for target in [0, 3, 42] {
            let err = d.revert(target, "alice").unwrap_err();
            assert_eq!(
                err,
                LedgerError::VersionNotFound {
                    requested: target,
                    latest: 2
                }
            );
        }
        assert_eq!(d.current_version(), 2);
    }

    #[test]
    fn versions_strictly_increase() {
        let mut d = doc("0");
        for step in 0..20u32 {
            let base = d.current_version();
            if step % 3 == 2 {
                d.revert(step / 2 + 1, "alice").unwrap();
            } else {
                d.commit(base, format!("{step}"), "alice", None).unwrap();
            }
            assert_eq!(d.current_version(), base + 1);
            assert_eq!(d.history().len() as u32, d.current_version());
        }
        let numbers: Vec<_> = d.history().iter().map(|v| v.version_number()).collect();
        assert_eq!(numbers, (1..=21).collect::<Vec<_>>());
    }

    #[test]
    fn from_history_rejects_gaps() {
        let mut d = doc("A");
        d.commit(1, "AB", "alice", None).unwrap();
        let mut versions = d.history().to_vec();
        versions.remove(0);

        assert!(matches!(
            VersionedDocument::from_history(d.article_id(), versions),
            Err(LedgerError::InvalidHistory(_))
        ));
        assert!(VersionedDocument::from_history(d.article_id(), Vec::new()).is_err());
    }

    #[test]
    fn serde_roundtrip_preserves_history() {
        let mut d = doc("A");
        d.commit(1, "AB", "alice", Some("typo".into())).unwrap();

        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["current_version"], 2);
        assert_eq!(json["content"], "AB");

        let back: VersionedDocument = serde_json::from_value(json).unwrap();
        assert_eq!(back, d);
    }
}
