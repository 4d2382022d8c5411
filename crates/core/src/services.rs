//! External analysis and recommendation collaborators.
//!
//! The editor never trusts a collaborator: every suggestion is checked
//! against the text it was computed for, and transport failures or timeouts
//! degrade to an empty result with a warning.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::article::Template;
use crate::patch::Suggestion;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("request timed out")]
    Timeout,
}

/// Citation consistency report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CitationReport {
    pub citation_count: u32,
    pub style_detected: String,
    pub consistent: bool,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    HighImpact,
    HighCitation,
    Relevant,
    Recent,
    Seminal,
}

/// A recommended paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    pub paper_id: String,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,
    pub year: i32,
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub citations: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(default)]
    pub relevance_score: f64,
}

#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn check_grammar(
        &self,
        text: &str,
        template: Template,
    ) -> Result<Vec<Suggestion>, ServiceError>;

    async fn check_formatting(
        &self,
        text: &str,
        template: Template,
    ) -> Result<Vec<Suggestion>, ServiceError>;

    async fn validate_citations(
        &self,
        text: &str,
        template: Template,
    ) -> Result<CitationReport, ServiceError>;
}

#[async_trait]
pub trait RecommendationService: Send + Sync {
    async fn recommend_papers(&self, context: &str, limit: usize)
        -> Result<Vec<Paper>, ServiceError>;

    async fn search_papers(
        &self,
        query: &str,
        limit: usize,
        kind: Option<RecommendationKind>,
    ) -> Result<Vec<Paper>, ServiceError>;
}

/// Suggestions that passed validation against one content snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuggestionBatch {
    /// Length, in chars, of the text the batch was requested for.
    pub snapshot_len: usize,
    pub suggestions: Vec<Suggestion>,
    /// Number of suggestions the service returned but that failed validation.
    pub rejected: usize,
}

impl SuggestionBatch {
    fn empty(text: &str) -> Self {
        Self {
            snapshot_len: text.chars().count(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.suggestions.is_empty()
    }
}

/// Request grammar and formatting suggestions for `text`.
///
/// A source that fails contributes nothing; the other source's suggestions
/// are kept. If the whole request exceeds `timeout` the batch is empty.
pub async fn fetch_suggestions(
    service: &dyn AnalysisService,
    text: &str,
    template: Template,
    timeout: Duration,
) -> SuggestionBatch {
    let requests = async {
        tokio::join!(
            service.check_grammar(text, template),
            service.check_formatting(text, template)
        )
    };
    let (grammar, formatting) = match tokio::time::timeout(timeout, requests).await {
        Ok(results) => results,
        Err(_) => {
            tracing::warn!(?timeout, "suggestion request timed out");
            return SuggestionBatch::empty(text);
        }
    };

    let mut batch = SuggestionBatch::empty(text);
    for (source, result) in [("grammar", grammar), ("formatting", formatting)] {
        let suggestions = match result {
            Ok(suggestions) => suggestions,
            Err(e) => {
                tracing::warn!(source, error = %e, "analysis request failed");
                continue;
            }
        };
        for suggestion in suggestions {
            if let Err(e) = suggestion.check(text) {
                tracing::warn!(source, error = %e, "dropping invalid suggestion");
                batch.rejected += 1;
            } else if !suggestion.has_valid_confidence() {
                tracing::warn!(
                    source,
                    confidence = suggestion.confidence,
                    "dropping suggestion with out-of-range confidence"
                );
                batch.rejected += 1;
            } else {
                batch.suggestions.push(suggestion);
            }
        }
    }

    tracing::debug!(
        accepted = batch.suggestions.len(),
        rejected = batch.rejected,
        "fetched suggestions"
    );
    batch
}

/// Request paper recommendations for `context`. Failures yield no papers.
pub async fn fetch_recommendations(
    service: &dyn RecommendationService,
    context: &str,
    limit: usize,
    timeout: Duration,
) -> Vec<Paper> {
    match tokio::time::timeout(timeout, service.recommend_papers(context, limit)).await {
        Ok(Ok(mut papers)) => {
            papers.truncate(limit);
            papers
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "recommendation request failed");
            Vec::new()
        }
        Err(_) => {
            tracing::warn!(?timeout, "recommendation request timed out");
            Vec::new()
        }
    }
}
