//! Append-only version history.
//!
//! A [`VersionedDocument`] owns its [`Version`]s. The only ways to change it
//! are [`VersionedDocument::commit`] and [`VersionedDocument::revert`], and
//! both append; nothing rewinds `current_version` or edits a stored version.

mod diff;
mod document;
mod version;

use thiserror::Error;

pub use diff::{diff_contents, DiffLine, DiffLineKind};
pub use document::VersionedDocument;
pub use version::Version;

pub const INITIAL_SUMMARY: &str = "Initial version";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The caller committed on top of a version that is no longer the latest.
    #[error("document is at version {actual}, commit was based on version {expected}")]
    ConcurrentModification { expected: u32, actual: u32 },

    #[error("version {requested} not found (latest is {latest})")]
    VersionNotFound { requested: u32, latest: u32 },

    #[error("invalid version history: {0}")]
    InvalidHistory(String),
}
