use std::time::Duration;

use async_trait::async_trait;
use manuscript_core::article::Template;
use manuscript_core::patch::Suggestion;
use manuscript_core::services::{AnalysisService, CitationReport, ServiceError};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::transport::ServiceHttp;

#[derive(Serialize)]
struct TextCheckRequest<'a> {
    text: &'a str,
    template: Template,
}

#[derive(Serialize)]
struct ConversionRequest<'a> {
    text: &'a str,
    from_format: &'a str,
    to_format: &'a str,
}

#[derive(Deserialize)]
struct ConversionResponse {
    latex: String,
}

#[derive(Serialize)]
struct ParagraphRequest<'a> {
    paragraph: &'a str,
}

/// One house-style rule of a publisher template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattingRule {
    pub rule_id: String,
    pub template: String,
    pub category: String,
    pub description: String,
    #[serde(default)]
    pub example: String,
}

/// Client for the editor analysis endpoints (`/editor/...`).
#[derive(Debug, Clone)]
pub struct HttpAnalysisClient {
    http: ServiceHttp,
}

impl HttpAnalysisClient {
    /// * `base_url` - service root, e.g. `http://localhost:8000/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Reuse an existing [`reqwest::Client`] and its connection pool.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http: ServiceHttp::new(client, base_url),
        }
    }

    /// Build a client whose requests fail after `timeout`.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self {
            http: ServiceHttp::with_timeout(base_url, timeout)?,
        })
    }

    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    /// Convert plain text to LaTeX markup.
    pub async fn convert_to_latex(&self, text: &str) -> Result<String, ClientError> {
        let request = ConversionRequest {
            text,
            from_format: "plain",
            to_format: "latex",
        };
        let response: ConversionResponse =
            self.http.post_json("/editor/convert/latex", &request).await?;
        Ok(response.latex)
    }

    /// Free-text suggestions for a more academic register.
    pub async fn suggest_improvements(&self, paragraph: &str) -> Result<Vec<String>, ClientError> {
        self.http
            .post_json("/editor/improve", &ParagraphRequest { paragraph })
            .await
    }

    /// House-style rules for `template`.
    ///
    /// The service answers 404 for a template it has no rules for.
    pub async fn formatting_rules(
        &self,
        template: Template,
    ) -> Result<Vec<FormattingRule>, ClientError> {
        let path = format!("/editor/templates/{}/rules", template.as_str());
        self.http.get_json(&path, &[] as &[(&str, &str)]).await
    }

    async fn check(
        &self,
        path: &str,
        text: &str,
        template: Template,
    ) -> Result<Vec<Suggestion>, ClientError> {
        self.http
            .post_json(path, &TextCheckRequest { text, template })
            .await
    }
}

#[async_trait]
impl AnalysisService for HttpAnalysisClient {
    async fn check_grammar(
        &self,
        text: &str,
        template: Template,
    ) -> Result<Vec<Suggestion>, ServiceError> {
        Ok(self.check("/editor/check/grammar", text, template).await?)
    }

    async fn check_formatting(
        &self,
        text: &str,
        template: Template,
    ) -> Result<Vec<Suggestion>, ServiceError> {
        Ok(self.check("/editor/check/formatting", text, template).await?)
    }

    async fn validate_citations(
        &self,
        text: &str,
        template: Template,
    ) -> Result<CitationReport, ServiceError> {
        Ok(self
            .http
            .post_json("/editor/validate/citations", &TextCheckRequest { text, template })
            .await?)
    }
}
