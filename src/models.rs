// Data structures (ChatRequest, Conversation, ChatMessage)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// Message role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

// One entry of the client-supplied history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

// POST /api/chat/stream body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub provider: String,
    pub model: String,
    pub conversation_id: String,
    pub messages: Vec<RequestMessage>,
}

impl ChatRequest {
    /// The new user turn, if the history ends with one
    pub fn latest_user_message(&self) -> Option<&RequestMessage> {
        self.messages.last().filter(|m| m.role == Role::User)
    }
}

// Persisted conversation metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub provider: String,
    pub model: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Persisted message row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub conversation_id: String,
    pub role: Role,
    pub content: String,
    /// Epoch milliseconds
    pub timestamp: i64,
}

impl ChatMessage {
    /// Build a new message with a fresh id and the current time
    pub fn new(conversation_id: impl Into<String>, role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            conversation_id: conversation_id.into(),
            role,
            content: content.into(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

// GET /api/conversations/{id} response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub messages: Vec<ChatMessage>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), r#""user""#);
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            r#""assistant""#
        );
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), r#""system""#);
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert_eq!("assistant".parse::<Role>().unwrap(), Role::Assistant);
        assert!("tool".parse::<Role>().is_err());
    }

    #[test]
    fn test_chat_request_deserialization() {
        let body = r#"{"provider":"openai","model":"gpt-4","conversationId":"c1","messages":[{"role":"user","content":"hi"}]}"#;
        let request: ChatRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.provider, "openai");
        assert_eq!(request.model, "gpt-4");
        assert_eq!(request.conversation_id, "c1");
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, Role::User);
        assert!(request.messages[0].images.is_none());
    }

    #[test]
    fn test_chat_request_with_images() {
        let body = json!({
            "provider": "openai",
            "model": "gpt-4o",
            "conversationId": "c2",
            "messages": [{"role": "user", "content": "look", "images": ["data:image/png;base64,AAA"]}]
        });
        let request: ChatRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.messages[0].images.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_role_rejected() {
        let body = r#"{"provider":"openai","model":"m","conversationId":"c","messages":[{"role":"robot","content":"x"}]}"#;
        assert!(serde_json::from_str::<ChatRequest>(body).is_err());
    }

    #[test]
    fn test_latest_user_message() {
        let mut request = ChatRequest {
            provider: "openai".to_string(),
            model: "gpt-4".to_string(),
            conversation_id: "c1".to_string(),
            messages: vec![
                RequestMessage {
                    role: Role::User,
                    content: "first".to_string(),
                    images: None,
                },
                RequestMessage {
                    role: Role::Assistant,
                    content: "reply".to_string(),
                    images: None,
                },
            ],
        };
        assert!(request.latest_user_message().is_none());

        request.messages.push(RequestMessage {
            role: Role::User,
            content: "second".to_string(),
            images: None,
        });
        assert_eq!(request.latest_user_message().unwrap().content, "second");

        request.messages.clear();
        assert!(request.latest_user_message().is_none());
    }

    #[test]
    fn test_chat_message_ids_are_unique() {
        let a = ChatMessage::new("c1", Role::User, "hi");
        let b = ChatMessage::new("c1", Role::User, "hi");
        assert_ne!(a.id, b.id);
        assert!(a.timestamp > 0);
    }

    #[test]
    fn test_conversation_response_shape() {
        let now = Utc::now();
        let response = ConversationResponse {
            conversation: Conversation {
                id: "c1".to_string(),
                title: String::new(),
                provider: "openai".to_string(),
                model: "gpt-4".to_string(),
                created_at: now,
                updated_at: now,
            },
            messages: vec![ChatMessage::new("c1", Role::User, "hi")],
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["id"], "c1");
        assert_eq!(value["provider"], "openai");
        assert!(value["createdAt"].is_string());
        assert_eq!(value["messages"][0]["conversationId"], "c1");
        assert_eq!(value["messages"][0]["role"], "user");
    }
}
