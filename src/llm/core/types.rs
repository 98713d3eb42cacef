//! Core types for the LLM abstraction layer

use serde::{Deserialize, Serialize};

use crate::models::{RequestMessage, Role};

/// Request to stream a chat completion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateRequest {
    /// Upstream model identifier
    pub model: String,
    /// Full conversation history, oldest first
    pub messages: Vec<Message>,
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
        }
    }
}

/// A single message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a new system message
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: text.into(),
        }
    }

    /// Create a new user message
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
        }
    }

    /// Create a new assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: text.into(),
        }
    }
}

// Images are not forwarded upstream.
impl From<&RequestMessage> for Message {
    fn from(message: &RequestMessage) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}
