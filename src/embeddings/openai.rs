//! OpenAI-compatible `/embeddings` HTTP backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::types::RagError;

use super::EmbeddingProvider;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/";

/// Embedding provider backed by an OpenAI-compatible `/embeddings` endpoint.
pub struct OpenAiEmbeddingProvider {
    client: Client,
    base_url: Url,
    api_key: String,
    model: String,
}

impl OpenAiEmbeddingProvider {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RagError> {
        let client = Client::builder()
            .timeout(timeout)
            .use_rustls_tls()
            .build()?;
        let base_url = Url::parse(DEFAULT_BASE_URL)
            .map_err(|err| RagError::Provider(err.to_string()))?;
        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Points the provider at a different OpenAI-compatible endpoint.
    /// The URL must end with a trailing slash for relative joins to resolve.
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    fn headers(&self) -> Result<HeaderMap, RagError> {
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", self.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|_| RagError::Provider("invalid OpenAI API key".to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let endpoint = self
            .base_url
            .join("embeddings")
            .map_err(|err| RagError::Provider(err.to_string()))?;
        let body = EmbeddingsRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(endpoint)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(RagError::Provider(format!(
                "embeddings endpoint returned {status}: {text}"
            )));
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|err| RagError::Provider(format!("invalid embeddings payload: {err}")))?;
        if parsed.data.len() != texts.len() {
            return Err(RagError::Provider(format!(
                "provider returned {} embeddings for {} inputs",
                parsed.data.len(),
                texts.len()
            )));
        }

        // `index` is authoritative; response order is not guaranteed.
        let mut data = parsed.data;
        data.sort_by_key(|item| item.index);
        Ok(data.into_iter().map(|item| item.embedding).collect())
    }
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}
