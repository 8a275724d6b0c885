//! Estimation service port and its chat-completions adapter.
//!
//! The estimator only sees [`EstimationService`]: one async method taking a
//! [`ChatRequest`] and returning the assistant's text. [`OpenAiService`] is
//! the production adapter; tests substitute scripted implementations.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Service responded with status {0}")]
    Status(u16),
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Response contained no choices")]
    EmptyChoices,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Body of a chat-completions request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Text of the first choice.
    pub fn into_content(self) -> Result<String, ServiceError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(ServiceError::EmptyChoices)
    }
}

/// A reasoning service able to answer one chat request.
#[async_trait]
pub trait EstimationService: Send + Sync {
    /// Send `request` and return the assistant's free-text reply.
    async fn complete(&self, request: &ChatRequest) -> Result<String, ServiceError>;
}

/// Chat-completions client authenticated with a bearer key.
#[derive(Clone)]
pub struct OpenAiService {
    http_client: HttpClient,
    api_key: String,
    endpoint: String,
}

impl OpenAiService {
    pub fn new(api_key: String, base_url: &str) -> Self {
        Self::with_client(HttpClient::new(), api_key, base_url)
    }

    /// Use a preconfigured HTTP client (proxy, TLS and pool settings).
    pub fn with_client(http_client: HttpClient, api_key: String, base_url: &str) -> Self {
        Self {
            http_client,
            api_key,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl EstimationService for OpenAiService {
    async fn complete(&self, request: &ChatRequest) -> Result<String, ServiceError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&body)?;
        parsed.into_content()
    }
}
