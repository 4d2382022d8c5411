use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ClientError;

/// Shared plumbing: one [`reqwest::Client`] bound to a base URL.
#[derive(Debug, Clone)]
pub(crate) struct ServiceHttp {
    client: reqwest::Client,
    base_url: String,
}

impl ServiceHttp {
    pub(crate) fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub(crate) fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::new(client, base_url))
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST {base_url}{path}` with a JSON body, decoding a JSON response.
    pub(crate) async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        tracing::debug!(%url, "service request");
        let response = self.client.post(url).json(body).send().await?;
        Self::parse_response(response).await
    }

    /// `GET {base_url}{path}` with `query` encoded into the URL.
    pub(crate) async fn get_json<Q, T>(&self, path: &str, query: &Q) -> Result<T, ClientError>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        tracing::debug!(%url, "service request");
        let response = self.client.get(url).query(query).send().await?;
        Self::parse_response(response).await
    }

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}
