//! Anthropic `/v1/messages` HTTP backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::types::RagError;

use super::{GeneratedAnswer, GenerationProvider, SYSTEM_PROMPT, build_user_prompt};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/";
const API_VERSION: &str = "2023-06-01";

/// Generation provider backed by the Anthropic messages API.
pub struct AnthropicGenerationProvider {
    client: Client,
    base_url: Url,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl AnthropicGenerationProvider {
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
            max_tokens: 1000,
            temperature: 0.3,
        })
    }

    /// Points the provider at a different endpoint (e.g. a test server).
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

#[async_trait]
impl GenerationProvider for AnthropicGenerationProvider {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        question: &str,
        context: &[String],
    ) -> Result<GeneratedAnswer, RagError> {
        let endpoint = self
            .base_url
            .join("v1/messages")
            .map_err(|err| RagError::Provider(err.to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(self.api_key.trim())
                .map_err(|_| RagError::Provider("invalid Anthropic API key".to_string()))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let user_prompt = build_user_prompt(question, context);
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system: SYSTEM_PROMPT,
            messages: vec![Message {
                role: "user",
                content: &user_prompt,
            }],
        };

        let response = self
            .client
            .post(endpoint)
            .headers(headers)
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
                "messages endpoint returned {status}: {text}"
            )));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|err| RagError::Provider(format!("invalid messages payload: {err}")))?;
        let text = parsed
            .content
            .into_iter()
            .filter_map(|block| match block {
                ResponseBlock::Text { text } => Some(text),
                ResponseBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n");
        if text.is_empty() {
            return Err(RagError::Provider(
                "messages response missing text content".to_string(),
            ));
        }

        let tokens_used = parsed
            .usage
            .map(|usage| usage.input_tokens + usage.output_tokens);
        Ok(GeneratedAnswer {
            text,
            model: self.model.clone(),
            tokens_used,
        })
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}
