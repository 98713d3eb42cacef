//! Relay orchestrator
//!
//! Owns one chat turn end to end:
//! 1. Persists the inbound user message and upserts the conversation
//! 2. Opens the upstream stream with the full history
//! 3. Forwards every fragment to the client channel while accumulating it
//! 4. Persists the assembled assistant message, then signals the end
//!
//! The client side is an `mpsc` channel of [`RelayEvent`]s. When the receiver
//! goes away (client disconnected) the turn stops immediately and the upstream
//! stream is dropped, which cancels the HTTP request.

mod policy;

pub use policy::PartialResponsePolicy;

use chrono::Utc;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::llm::{GenerateRequest, LlmError, LlmProvider, Message};
use crate::models::{ChatMessage, ChatRequest, Role};
use crate::store::{ConversationStore, ConversationUpsert};

/// Events pushed to the client during a turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    /// One text delta
    Message(String),
    /// Upstream failure description; terminal apart from `End`
    Error(String),
    /// Always the last event of a turn that was not cancelled
    End,
}

/// How a turn finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Upstream reached its end marker; `content` was persisted
    Completed { content: String },
    /// Upstream failed; `partial` is what had been forwarded so far
    Failed { error: String, partial: String },
    /// The client went away before the turn finished
    Cancelled { partial: String },
}

enum StreamResult {
    Completed(String),
    Failed(LlmError, String),
    Cancelled(String),
}

/// Coordinates chat turns against a conversation store
#[derive(Clone)]
pub struct RelayOrchestrator {
    store: Arc<dyn ConversationStore>,
    policy: PartialResponsePolicy,
}

impl RelayOrchestrator {
    pub fn new(store: Arc<dyn ConversationStore>, policy: PartialResponsePolicy) -> Self {
        Self { store, policy }
    }

    /// Run one turn, pushing events into `events`
    ///
    /// Persistence failures are logged and never change what the client sees.
    pub async fn run(
        &self,
        provider: Arc<dyn LlmProvider>,
        request: ChatRequest,
        events: mpsc::Sender<RelayEvent>,
    ) -> TurnOutcome {
        self.persist_inbound(&request).await;

        let upstream = GenerateRequest::new(
            request.model.clone(),
            request.messages.iter().map(Message::from).collect(),
        );
        let result = relay_fragments(provider.as_ref(), upstream, &events).await;

        self.finalize(&request, result, &events).await
    }

    async fn persist_inbound(&self, request: &ChatRequest) {
        if let Some(latest) = request.latest_user_message() {
            let message = ChatMessage::new(&request.conversation_id, Role::User, &latest.content);
            self.persist_message(&message).await;
        }

        let upsert = ConversationUpsert {
            id: request.conversation_id.clone(),
            provider: request.provider.clone(),
            model: request.model.clone(),
            at: Utc::now(),
        };
        match self.store.upsert_conversation(&upsert).await {
            Ok(outcome) => debug!(
                conversation_id = %upsert.id,
                ?outcome,
                "conversation upserted"
            ),
            Err(e) => error!(
                conversation_id = %upsert.id,
                error = %e,
                "failed to upsert conversation"
            ),
        }
    }

    async fn finalize(
        &self,
        request: &ChatRequest,
        result: StreamResult,
        events: &mpsc::Sender<RelayEvent>,
    ) -> TurnOutcome {
        let conversation_id = &request.conversation_id;
        match result {
            StreamResult::Completed(content) => {
                let message = ChatMessage::new(conversation_id, Role::Assistant, &content);
                self.persist_message(&message).await;
                let _ = events.send(RelayEvent::End).await;

                info!(
                    conversation_id = %conversation_id,
                    model = %request.model,
                    chars = content.chars().count(),
                    "chat turn completed"
                );
                TurnOutcome::Completed { content }
            }
            StreamResult::Failed(e, partial) => {
                let description = e.to_string();
                error!(
                    conversation_id = %conversation_id,
                    error = %description,
                    partial_chars = partial.chars().count(),
                    "upstream stream failed"
                );
                let _ = events.send(RelayEvent::Error(description.clone())).await;

                if let Some(text) = self.policy.retained(&partial) {
                    let message = ChatMessage::new(conversation_id, Role::Assistant, text);
                    self.persist_message(&message).await;
                }
                let _ = events.send(RelayEvent::End).await;

                TurnOutcome::Failed {
                    error: description,
                    partial,
                }
            }
            StreamResult::Cancelled(partial) => {
                warn!(
                    conversation_id = %conversation_id,
                    partial_chars = partial.chars().count(),
                    "client disconnected; chat turn cancelled"
                );
                TurnOutcome::Cancelled { partial }
            }
        }
    }

    async fn persist_message(&self, message: &ChatMessage) {
        if let Err(e) = self.store.insert_message(message).await {
            error!(
                conversation_id = %message.conversation_id,
                role = %message.role,
                error = %e,
                "failed to persist message"
            );
        }
    }
}

/// Pump fragments from the provider to the client until one side finishes
async fn relay_fragments(
    provider: &dyn LlmProvider,
    upstream: GenerateRequest,
    events: &mpsc::Sender<RelayEvent>,
) -> StreamResult {
    let mut stream = tokio::select! {
        biased;
        _ = events.closed() => return StreamResult::Cancelled(String::new()),
        opened = provider.stream_chat(upstream) => match opened {
            Ok(stream) => stream,
            Err(e) => return StreamResult::Failed(e, String::new()),
        },
    };

    let mut accumulated = String::new();
    loop {
        let next = tokio::select! {
            biased;
            _ = events.closed() => return StreamResult::Cancelled(accumulated),
            next = stream.next() => next,
        };

        match next {
            Some(Ok(fragment)) => {
                accumulated.push_str(&fragment);
                if events.send(RelayEvent::Message(fragment)).await.is_err() {
                    return StreamResult::Cancelled(accumulated);
                }
            }
            Some(Err(e)) => return StreamResult::Failed(e, accumulated),
            None => return StreamResult::Completed(accumulated),
        }
    }
}
