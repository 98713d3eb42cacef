//! Provider trait and the closed set of provider variants

use async_trait::async_trait;
use futures::stream::Stream;
use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;

use super::{error::LlmError, types::GenerateRequest};
use crate::config::Config;
use crate::llm::openai::OpenAiClient;

/// Lazy, finite sequence of text fragments from an upstream completion
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// Main interface that all LLM provider implementations must satisfy
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Open a streaming chat completion
    ///
    /// Resolves once the upstream accepted the request (success status). The
    /// returned stream yields text deltas in provider order and ends on the
    /// provider's end marker or when the body closes. Dropping the stream
    /// releases the upstream connection.
    async fn stream_chat(&self, request: GenerateRequest) -> Result<TextStream, LlmError>;
}

/// Supported upstream providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// OpenAI-compatible `/chat/completions` endpoint
    OpenAi,
}

impl ProviderKind {
    /// Every supported variant
    pub const ALL: [ProviderKind; 1] = [ProviderKind::OpenAi];

    /// Identifier used in requests
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unsupported provider: {}", s))
    }
}

/// Create the client for one provider variant from configuration
pub fn create_provider(
    kind: ProviderKind,
    config: &Config,
) -> Result<Arc<dyn LlmProvider>, LlmError> {
    match kind {
        ProviderKind::OpenAi => {
            let client = OpenAiClient::new(
                config.openai_api_key.clone(),
                config.openai_base_url.clone(),
                config.upstream_timeout,
            )?;
            Ok(Arc::new(client))
        }
    }
}

/// Live provider clients keyed by variant
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderKind, Arc<dyn LlmProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry with a client for every supported variant
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        let mut registry = Self::new();
        for kind in ProviderKind::ALL {
            registry.register(kind, create_provider(kind, config)?);
        }
        Ok(registry)
    }

    /// Add or replace the client for a variant
    pub fn register(&mut self, kind: ProviderKind, provider: Arc<dyn LlmProvider>) {
        self.providers.insert(kind, provider);
    }

    /// Resolve a request's `provider` string to a live client
    pub fn resolve(&self, name: &str) -> Option<(ProviderKind, Arc<dyn LlmProvider>)> {
        let kind = name.parse::<ProviderKind>().ok()?;
        self.providers
            .get(&kind)
            .map(|provider| (kind, Arc::clone(provider)))
    }
}
