//! Error types for the LLM layer

use thiserror::Error;

/// Errors that can occur when talking to an upstream provider
#[derive(Debug, Error)]
pub enum LlmError {
    /// Upstream answered with a non-success status
    #[error("HTTP error (status {status}): {body}")]
    HttpError { status: u16, body: String },

    /// Request could not be sent or the connection failed
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Upstream did not finish within the configured deadline
    #[error("Upstream request timed out")]
    Timeout,

    /// Reading or decoding the streamed body failed
    #[error("Stream error: {0}")]
    StreamError(String),

    /// JSON encoding/decoding issues
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Client could not be configured
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else if let Some(status) = err.status() {
            LlmError::HttpError {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else if err.is_body() || err.is_decode() {
            LlmError::StreamError(err.to_string())
        } else {
            LlmError::ConnectionError(err.to_string())
        }
    }
}
