//! Conversation store
//!
//! [`ConversationStore`] is the only persistence surface the relay needs: append
//! a message, upsert conversation metadata, and read a conversation back.
//! Three backends implement it:
//!
//! - [`SqliteStore`]: the default, a single file at `DB_PATH`
//! - [`PostgresStore`]: selected when `DATABASE_URL` is set
//! - [`MemoryStore`]: process-local, used by tests
//!
//! All backends create their tables on connect.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::models::{ChatMessage, Conversation};

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use sqlite::SqliteStore;

/// Conversation metadata written on every chat turn
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationUpsert {
    pub id: String,
    pub provider: String,
    pub model: String,
    /// Used as `created_at` on create and `updated_at` on both paths
    pub at: DateTime<Utc>,
}

/// Which branch an upsert took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Persistence operations used by the relay and the read API
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Append an immutable message row
    async fn insert_message(&self, message: &ChatMessage) -> Result<()>;

    /// Create the conversation if absent, otherwise update only `model` and `updated_at`
    async fn upsert_conversation(&self, upsert: &ConversationUpsert) -> Result<UpsertOutcome>;

    /// Look up a conversation that has not been soft-deleted
    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>>;

    /// Messages of a conversation in insertion order
    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<ChatMessage>>;

    /// Cheap connectivity probe
    async fn ping(&self) -> Result<()>;
}

/// Open the backend selected by the configuration
pub async fn connect(config: &Config) -> Result<Arc<dyn ConversationStore>> {
    match &config.database_url {
        Some(url) => {
            info!("Initializing PostgreSQL conversation store");
            Ok(Arc::new(PostgresStore::connect(url).await?))
        }
        None => {
            info!(path = %config.db_path, "Initializing SQLite conversation store");
            Ok(Arc::new(SqliteStore::connect(&config.db_path).await?))
        }
    }
}
