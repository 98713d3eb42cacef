//! OpenAI-compatible provider implementation
//!
//! Talks to any endpoint that speaks the `/chat/completions` streaming
//! protocol (OpenAI itself, or a compatible gateway set via `OPENAI_BASE_URL`).

pub mod client;
pub mod sse;
pub mod types;

// Re-export commonly used types
pub use client::OpenAiClient;
