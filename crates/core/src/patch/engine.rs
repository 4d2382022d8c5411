//! Single-suggestion application.

use super::{PatchError, Suggestion};

/// Apply one suggestion to `content`, returning the new text.
///
/// The anchored range must lie inside `content` and hold exactly
/// `suggestion.original`; otherwise nothing is replaced.
pub fn apply_one(content: &str, suggestion: &Suggestion) -> Result<String, PatchError> {
    let (start, end) = suggestion.locate(content)?;

    let mut next =
        String::with_capacity(content.len() - (end - start) + suggestion.replacement.len());
    next.push_str(&content[..start]);
    next.push_str(&suggestion.replacement);
    next.push_str(&content[end..]);

    tracing::trace!(
        kind = %suggestion.kind,
        position = suggestion.position,
        length = suggestion.length,
        "applied suggestion"
    );
    Ok(next)
}

/// Translate a character range into byte offsets, or `None` if it runs past the end.
pub(crate) fn byte_range(content: &str, position: usize, length: usize) -> Option<(usize, usize)> {
    position.checked_add(length)?;
    let mut offsets = content
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(content.len()));
    let start = offsets.nth(position)?;
    let end = if length == 0 {
        start
    } else {
        offsets.nth(length - 1)?
    };
    Some((start, end))
}
