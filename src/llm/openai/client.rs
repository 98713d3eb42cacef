//! OpenAI client implementation

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::llm::core::{
    error::LlmError,
    provider::{LlmProvider, TextStream},
    types::GenerateRequest,
};

use super::sse::parse_sse_stream;
use super::types::ChatCompletionRequest;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for OpenAI-compatible streaming chat completions
pub struct OpenAiClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Bearer token
    api_key: String,
    /// API base, e.g. `https://api.openai.com/v1`
    base_url: String,
}

impl OpenAiClient {
    /// Create a new OpenAI client
    ///
    /// # Arguments
    ///
    /// * `api_key` - Bearer token sent upstream
    /// * `base_url` - API base URL without trailing slash
    /// * `timeout` - Optional deadline for a whole request, streaming included
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, LlmError> {
        let mut builder = Client::builder().connect_timeout(CONNECT_TIMEOUT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().map_err(|e| {
            LlmError::InvalidConfiguration(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self {
            http_client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Build the endpoint URL for streaming
    fn build_endpoint_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl LlmProvider for OpenAiClient {
    async fn stream_chat(&self, request: GenerateRequest) -> Result<TextStream, LlmError> {
        let body = ChatCompletionRequest::from(request);

        let response = self
            .http_client
            .post(self.build_endpoint_url())
            .bearer_auth(&self.api_key)
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::HttpError {
                status: status.as_u16(),
                body,
            });
        }

        Ok(parse_sse_stream(response.bytes_stream()))
    }
}
