use std::time::Duration;

use async_trait::async_trait;
use manuscript_core::services::{Paper, RecommendationKind, RecommendationService, ServiceError};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::transport::ServiceHttp;

#[derive(Serialize)]
struct RecommendRequest<'a> {
    context: &'a str,
    limit: usize,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    recommendation_type: Option<RecommendationKind>,
}

#[derive(Serialize)]
struct SentenceRequest<'a> {
    sentence: &'a str,
}

#[derive(Serialize)]
struct ParagraphRequest<'a> {
    paragraph: &'a str,
}

#[derive(Serialize)]
struct CitationRequest<'a> {
    topic: &'a str,
}

#[derive(Serialize)]
struct FieldQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'a str>,
    limit: usize,
}

/// A rephrased sentence with formality and clarity scores in `0.0..=1.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceOptimization {
    pub original_sentence: String,
    pub optimized_sentence: String,
    #[serde(default)]
    pub improvements: Vec<String>,
    pub formality_score: f64,
    pub clarity_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParagraphOptimization {
    pub original: String,
    pub optimized: String,
    #[serde(default)]
    pub sentence_optimizations: Vec<SentenceOptimization>,
    pub overall_formality: f64,
    pub overall_clarity: f64,
}

/// Client for the literature recommendation endpoints (`/recommendations/...`).
#[derive(Debug, Clone)]
pub struct HttpRecommendationClient {
    http: ServiceHttp,
}

impl HttpRecommendationClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http: ServiceHttp::new(client, base_url),
        }
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self {
            http: ServiceHttp::with_timeout(base_url, timeout)?,
        })
    }

    pub async fn optimize_sentence(
        &self,
        sentence: &str,
    ) -> Result<SentenceOptimization, ClientError> {
        self.http
            .post_json("/recommendations/optimize/sentence", &SentenceRequest { sentence })
            .await
    }

    pub async fn optimize_paragraph(
        &self,
        paragraph: &str,
    ) -> Result<ParagraphOptimization, ClientError> {
        self.http
            .post_json("/recommendations/optimize/paragraph", &ParagraphRequest { paragraph })
            .await
    }

    /// Formatted citation strings for well-cited papers on `topic`.
    pub async fn citation_suggestions(&self, topic: &str) -> Result<Vec<String>, ClientError> {
        self.http
            .post_json("/recommendations/citations", &CitationRequest { topic })
            .await
    }

    /// Highly cited papers, optionally restricted to `field`.
    pub async fn high_impact_papers(
        &self,
        field: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Paper>, ClientError> {
        self.http
            .get_json("/recommendations/papers/high-impact", &FieldQuery { field, limit })
            .await
    }

    pub async fn recent_papers(
        &self,
        field: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Paper>, ClientError> {
        self.http
            .get_json("/recommendations/papers/recent", &FieldQuery { field, limit })
            .await
    }
}

#[async_trait]
impl RecommendationService for HttpRecommendationClient {
    async fn recommend_papers(
        &self,
        context: &str,
        limit: usize,
    ) -> Result<Vec<Paper>, ServiceError> {
        Ok(self
            .http
            .post_json("/recommendations/recommend", &RecommendRequest { context, limit })
            .await?)
    }

    async fn search_papers(
        &self,
        query: &str,
        limit: usize,
        kind: Option<RecommendationKind>,
    ) -> Result<Vec<Paper>, ServiceError> {
        let request = SearchRequest {
            query,
            limit,
            recommendation_type: kind,
        };
        Ok(self.http.post_json("/recommendations/search", &request).await?)
    }
}
