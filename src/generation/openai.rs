//! OpenAI-compatible `/chat/completions` HTTP backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::types::RagError;

use super::{GeneratedAnswer, GenerationProvider, SYSTEM_PROMPT, build_user_prompt};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/";

/// Generation provider backed by an OpenAI-compatible chat completions
/// endpoint.
pub struct OpenAiGenerationProvider {
    client: Client,
    base_url: Url,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiGenerationProvider {
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

    /// Points the provider at a different OpenAI-compatible endpoint.
    /// The URL must end with a trailing slash for relative joins to resolve.
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

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl GenerationProvider for OpenAiGenerationProvider {
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
            .join("chat/completions")
            .map_err(|err| RagError::Provider(err.to_string()))?;

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", self.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|_| RagError::Provider("invalid OpenAI API key".to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let user_prompt = build_user_prompt(question, context);
        let body = ChatRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
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
                "chat completions endpoint returned {status}: {text}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|err| RagError::Provider(format!("invalid chat payload: {err}")))?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| RagError::Provider("chat response contained no choices".to_string()))?;

        Ok(GeneratedAnswer {
            text,
            model: self.model.clone(),
            tokens_used: parsed.usage.map(|usage| usage.total_tokens),
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}
