//! LLM abstraction layer
//!
//! This module provides a single "stream chat completion" contract
//! ([`LlmProvider`]) and the closed set of upstream providers that implement it.

pub mod core;
pub mod openai;

// Re-export commonly used types
pub use core::{
    error::LlmError,
    provider::{create_provider, LlmProvider, ProviderKind, ProviderRegistry, TextStream},
    types::{GenerateRequest, Message},
};
pub use openai::OpenAiClient;
