//! Suggestion types matching the analysis service's wire protocol.
//!
//! A suggestion is anchored to the exact snapshot it was computed against.
//! Offsets and lengths count Unicode scalar values, not bytes.
use std::fmt;

use serde::{Deserialize, Serialize};

use super::PatchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Grammar,
    Spelling,
    Style,
    Formatting,
    Latex,
    Citation,
}

impl SuggestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionKind::Grammar => "grammar",
            SuggestionKind::Spelling => "spelling",
            SuggestionKind::Style => "style",
            SuggestionKind::Formatting => "formatting",
            SuggestionKind::Latex => "latex",
            SuggestionKind::Citation => "citation",
        }
    }
}

impl fmt::Display for SuggestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proposed edit: replace `length` characters at `position` with `replacement`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub position: usize,
    pub length: usize,
    /// Text expected at `position..position + length` in the snapshot.
    pub original: String,
    #[serde(rename = "suggestion")]
    pub replacement: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub confidence: f64,
}

impl Suggestion {
    pub fn new(
        kind: SuggestionKind,
        position: usize,
        original: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Self {
        let original = original.into();
        Self {
            kind,
            position,
            length: original.chars().count(),
            original,
            replacement: replacement.into(),
            explanation: String::new(),
            confidence: 1.0,
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Exclusive end offset of the anchored range, `None` if it overflows.
    pub fn end(&self) -> Option<usize> {
        self.position.checked_add(self.length)
    }

    /// Change in document length once this suggestion is applied.
    pub fn delta(&self) -> isize {
        self.replacement.chars().count() as isize - self.length as isize
    }

    /// Whether this suggestion's range intersects `start..end`.
    ///
    /// Ranges are half-open, so an insertion only intersects a range it
    /// falls strictly inside of.
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.position < end && start < self.end().unwrap_or(usize::MAX)
    }

    /// Copy of this suggestion re-anchored at `position`.
    pub fn at(&self, position: usize) -> Self {
        Self {
            position,
            ..self.clone()
        }
    }

    /// Check the suggestion's geometry and anchored text against `snapshot`.
    pub fn check(&self, snapshot: &str) -> Result<(), PatchError> {
        self.locate(snapshot).map(|_| ())
    }

    /// Byte range of the anchored text in `snapshot`, once validated.
    pub(crate) fn locate(&self, snapshot: &str) -> Result<(usize, usize), PatchError> {
        let (start, end) = super::engine::byte_range(snapshot, self.position, self.length)
            .ok_or_else(|| PatchError::Range {
                position: self.position,
                length: self.length,
                content_len: snapshot.chars().count(),
            })?;
        let found = &snapshot[start..end];
        if found != self.original {
            return Err(PatchError::Stale {
                position: self.position,
                expected: self.original.clone(),
                found: found.to_string(),
            });
        }
        Ok((start, end))
    }

    pub fn has_valid_confidence(&self) -> bool {
        (0.0..=1.0).contains(&self.confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_wire_shape() {
        let json = r#"{
            "type": "grammar",
            "position": 9,
            "length": 6,
            "original": "is was",
            "suggestion": "was",
            "explanation": "Duplicate verb",
            "confidence": 0.92
        }"#;
        let s: Suggestion = serde_json::from_str(json).unwrap();
        assert_eq!(s.kind, SuggestionKind::Grammar);
        assert_eq!(s.replacement, "was");
        assert_eq!(s.end(), Some(15));
        assert_eq!(s.delta(), -3);
    }

    #[test]
    fn overlap_is_half_open() {
        let s = Suggestion::new(SuggestionKind::Style, 4, "data", "results");
        assert!(s.overlaps(0, 5));
        assert!(s.overlaps(7, 9));
        assert!(!s.overlaps(0, 4));
        assert!(!s.overlaps(8, 10));

        let insertion = Suggestion::new(SuggestionKind::Citation, 6, "", " [1]");
        assert!(insertion.overlaps(4, 8));
        assert!(!insertion.overlaps(6, 8));
        assert!(!insertion.overlaps(2, 6));
    }

    #[test]
    fn check_reports_range_and_stale() {
        let text = "The data is was collected.";
        let bad_range = Suggestion::new(SuggestionKind::Grammar, 24, "d. extra", "");
        assert!(matches!(bad_range.check(text), Err(PatchError::Range { .. })));

        let moved = Suggestion::new(SuggestionKind::Grammar, 12, "is was", "was");
        assert!(matches!(moved.check(text), Err(PatchError::Stale { .. })));

        let good = Suggestion::new(SuggestionKind::Grammar, 9, "is was", "was");
        assert!(good.check(text).is_ok());
    }

    #[test]
    fn overflowing_length_is_a_range_error() {
        let mut huge = Suggestion::new(SuggestionKind::Grammar, 1, "b", "x");
        huge.length = usize::MAX;
        assert_eq!(huge.end(), None);
        assert!(huge.overlaps(0, 2));
        assert!(matches!(huge.check("abc"), Err(PatchError::Range { .. })));
    }
}
