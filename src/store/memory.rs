//! In-memory implementation of [`ConversationStore`]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::models::{ChatMessage, Conversation};

use super::{ConversationStore, ConversationUpsert, Result, UpsertOutcome};

#[derive(Debug, Default)]
struct MemoryState {
    conversations: HashMap<String, Conversation>,
    messages: Vec<ChatMessage>,
}

/// Process-local store backed by a mutex-guarded map
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of conversation rows
    pub fn conversation_count(&self) -> usize {
        self.lock().conversations.len()
    }

    /// Number of message rows across all conversations
    pub fn message_count(&self) -> usize {
        self.lock().messages.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // Every mutation is a single push or insert
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn insert_message(&self, message: &ChatMessage) -> Result<()> {
        self.lock().messages.push(message.clone());
        Ok(())
    }

    async fn upsert_conversation(&self, upsert: &ConversationUpsert) -> Result<UpsertOutcome> {
        let mut state = self.lock();
        match state.conversations.get_mut(&upsert.id) {
            Some(existing) => {
                existing.model = upsert.model.clone();
                existing.updated_at = upsert.at;
                Ok(UpsertOutcome::Updated)
            }
            None => {
                state.conversations.insert(
                    upsert.id.clone(),
                    Conversation {
                        id: upsert.id.clone(),
                        title: String::new(),
                        provider: upsert.provider.clone(),
                        model: upsert.model.clone(),
                        created_at: upsert.at,
                        updated_at: upsert.at,
                    },
                );
                Ok(UpsertOutcome::Created)
            }
        }
    }

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>> {
        Ok(self.lock().conversations.get(id).cloned())
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<ChatMessage>> {
        Ok(self
            .lock()
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
