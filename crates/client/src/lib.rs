//! HTTP clients for the external analysis and recommendation services.
//!
//! Both clients implement the collaborator traits from
//! [`manuscript_core::services`], so the editor can swap them for fakes.
//! Endpoints the editing loop does not depend on (LaTeX conversion,
//! rephrasing, template rules, paper listings) are inherent methods.

mod analysis;
mod error;
mod transport;
mod recommendation;

pub use analysis::{FormattingRule, HttpAnalysisClient};
pub use error::ClientError;
pub use recommendation::{HttpRecommendationClient, ParagraphOptimization, SentenceOptimization};
