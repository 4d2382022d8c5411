mod model;
mod validate;

pub use model::{Article, ArticleCreate, ArticlePatch, ArticleStatus, Template};
pub(crate) use model::ArticleMetadata;
pub use validate::{
    validate_create, validate_patch, ValidationError, MAX_ABSTRACT_CHARS, MAX_TITLE_CHARS,
};
