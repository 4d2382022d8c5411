//! Pending suggestion set with offset-invalidation.
//!
//! Every suggestion gets a [`SuggestionId`] when it enters the set. Entries
//! keep the suggestion as issued plus its current position, which moves as
//! other suggestions are applied:
//!
//! - entries at or after the applied range shift by the applied delta
//! - entries whose range intersects the applied range become stale
//! - entries before the applied range are untouched

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{apply_one, PatchError, Suggestion};

/// Stable identifier assigned when a suggestion enters a pending set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SuggestionId(u64);

impl SuggestionId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SuggestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum PendingStatus {
    Pending,
    /// An overlapping suggestion was applied first.
    Stale { superseded_by: SuggestionId },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSuggestion {
    id: SuggestionId,
    issued: Suggestion,
    position: usize,
    status: PendingStatus,
}

impl PendingSuggestion {
    pub fn id(&self) -> SuggestionId {
        self.id
    }

    /// The suggestion exactly as the analysis service issued it.
    pub fn issued(&self) -> &Suggestion {
        &self.issued
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn status(&self) -> PendingStatus {
        self.status
    }

    pub fn is_stale(&self) -> bool {
        matches!(self.status, PendingStatus::Stale { .. })
    }

    /// The issued suggestion anchored at its current position.
    pub fn current(&self) -> Suggestion {
        self.issued.at(self.position)
    }
}

/// A suggestion from a batch that could not be applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub id: SuggestionId,
    pub error: PatchError,
}

/// Result of applying several suggestions in one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub content: String,
    pub applied: Vec<SuggestionId>,
    pub rejected: Vec<Rejection>,
}

impl BatchOutcome {
    pub fn is_complete_success(&self) -> bool {
        self.rejected.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct PendingSuggestions {
    next_id: u64,
    entries: HashMap<SuggestionId, PendingSuggestion>,
}

impl PendingSuggestions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a freshly fetched suggestion and return its identifier.
    pub fn push(&mut self, suggestion: Suggestion) -> SuggestionId {
        let id = SuggestionId(self.next_id);
        self.next_id += 1;
        self.entries.insert(
            id,
            PendingSuggestion {
                id,
                position: suggestion.position,
                issued: suggestion,
                status: PendingStatus::Pending,
            },
        );
        id
    }

    pub fn extend(&mut self, suggestions: impl IntoIterator<Item = Suggestion>) -> Vec<SuggestionId> {
        suggestions.into_iter().map(|s| self.push(s)).collect()
    }

    pub fn get(&self, id: SuggestionId) -> Option<&PendingSuggestion> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove a suggestion without applying it.
    pub fn dismiss(&mut self, id: SuggestionId) -> Option<PendingSuggestion> {
        self.entries.remove(&id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries ordered by current position, ties broken by arrival order.
    pub fn ordered(&self) -> Vec<&PendingSuggestion> {
        let mut entries: Vec<_> = self.entries.values().collect();
        entries.sort_by_key(|e| (e.position, e.id));
        entries
    }

    /// Apply one pending suggestion to `content`.
    ///
    /// On success the suggestion leaves the set and the remaining entries are
    /// rebased onto the returned text. On failure the set is left unchanged.
    pub fn apply(&mut self, content: &str, id: SuggestionId) -> Result<String, PatchError> {
        let entry = self
            .entries
            .get(&id)
            .ok_or(PatchError::UnknownSuggestion(id))?;
        if let PendingStatus::Stale { superseded_by } = entry.status {
            return Err(PatchError::Superseded {
                id,
                by: superseded_by,
            });
        }

        let applied = entry.current();
        let next = apply_one(content, &applied)?;
        self.entries.remove(&id);
        self.rebase_after(id, &applied);
        Ok(next)
    }

    /// Apply the selected suggestions left to right.
    ///
    /// Each failure is recorded against its id; the remaining selections are
    /// still attempted against the text produced so far.
    pub fn apply_batch(&mut self, content: &str, ids: &[SuggestionId]) -> BatchOutcome {
        let mut selected: Vec<(usize, SuggestionId)> = ids
            .iter()
            .map(|id| (self.entries.get(id).map_or(usize::MAX, |e| e.position), *id))
            .collect();
        selected.sort();
        selected.dedup_by_key(|(_, id)| *id);

        let mut current = content.to_string();
        let mut applied = Vec::new();
        let mut rejected = Vec::new();

        for (_, id) in selected {
            match self.apply(&current, id) {
                Ok(next) => {
                    current = next;
                    applied.push(id);
                }
                Err(error) => {
                    tracing::debug!(suggestion = %id, %error, "suggestion rejected");
                    rejected.push(Rejection { id, error });
                }
            }
        }

        BatchOutcome {
            content: current,
            applied,
            rejected,
        }
    }

    fn rebase_after(&mut self, applied_id: SuggestionId, applied: &Suggestion) {
        let start = applied.position;
        let end = applied.end().unwrap_or(usize::MAX);
        let delta = applied.delta();

        for entry in self.entries.values_mut() {
            let entry_end = entry.position.saturating_add(entry.issued.length);
            if entry.position < end && start < entry_end {
                if !entry.is_stale() {
                    entry.status = PendingStatus::Stale {
                        superseded_by: applied_id,
                    };
                }
            } else if entry.position >= end {
                entry.position = entry.position.saturating_add_signed(delta);
            }
        }
    }
}
