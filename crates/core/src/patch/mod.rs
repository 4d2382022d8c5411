//! Positional patch application.
//!
//! [`apply_one`] is a pure function over a snapshot and one suggestion.
//! [`PendingSuggestions`] applies a batch left to right, shifting the
//! suggestions still waiting so they stay anchored to the edited text.

mod engine;
mod pending;
mod suggestion;

use thiserror::Error;

pub use engine::apply_one;
pub use pending::{
    BatchOutcome, PendingStatus, PendingSuggestion, PendingSuggestions, Rejection, SuggestionId,
};
pub use suggestion::{Suggestion, SuggestionKind};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PatchError {
    #[error("range {position}+{length} exceeds document length {content_len}")]
    Range {
        position: usize,
        length: usize,
        content_len: usize,
    },

    #[error("stale suggestion at {position}: expected {expected:?}, found {found:?}")]
    Stale {
        position: usize,
        expected: String,
        found: String,
    },

    #[error("suggestion {id} overlaps already applied suggestion {by}")]
    Superseded { id: SuggestionId, by: SuggestionId },

    #[error("unknown suggestion {0}")]
    UnknownSuggestion(SuggestionId),
}

impl PatchError {
    /// Stale errors are recovered by re-fetching suggestions for the current text.
    pub fn is_stale(&self) -> bool {
        matches!(self, PatchError::Stale { .. } | PatchError::Superseded { .. })
    }
}
