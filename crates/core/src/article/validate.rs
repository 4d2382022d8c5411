//! Article input validation.
use thiserror::Error;

use super::{ArticleCreate, ArticlePatch};

pub const MAX_TITLE_CHARS: usize = 500;
pub const MAX_ABSTRACT_CHARS: usize = 5000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("article title cannot be empty")]
    EmptyTitle,
    #[error("article title is {0} characters, limit is {MAX_TITLE_CHARS}")]
    TitleTooLong(usize),
    #[error("article abstract is {0} characters, limit is {MAX_ABSTRACT_CHARS}")]
    AbstractTooLong(usize),
    #[error("content changes require base_version")]
    MissingBaseVersion,
}

pub fn validate_create(input: &ArticleCreate) -> Result<(), ValidationError> {
    validate_title(&input.title)?;
    validate_abstract(input.abstract_text.as_deref())
}

pub fn validate_patch(patch: &ArticlePatch) -> Result<(), ValidationError> {
    if let Some(title) = &patch.title {
        validate_title(title)?;
    }
    validate_abstract(patch.abstract_text.as_deref())?;
    if patch.content.is_some() && patch.base_version.is_none() {
        return Err(ValidationError::MissingBaseVersion);
    }
    Ok(())
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    match title.trim().chars().count() {
        0 => Err(ValidationError::EmptyTitle),
        n if n > MAX_TITLE_CHARS => Err(ValidationError::TitleTooLong(n)),
        _ => Ok(()),
    }
}

fn validate_abstract(abstract_text: Option<&str>) -> Result<(), ValidationError> {
    match abstract_text.map(|a| a.chars().count()) {
        Some(n) if n > MAX_ABSTRACT_CHARS => Err(ValidationError::AbstractTooLong(n)),
        _ => Ok(()),
    }
}
