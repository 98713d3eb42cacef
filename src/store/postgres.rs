//! PostgreSQL implementation of [`ConversationStore`]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::{NoTls, Row};

use crate::models::{ChatMessage, Conversation, Role};

use super::{ConversationStore, ConversationUpsert, Result, StoreError, UpsertOutcome};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS conversations (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL DEFAULT '',
        provider TEXT NOT NULL,
        model TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL,
        deleted_at TIMESTAMPTZ
    );
    CREATE INDEX IF NOT EXISTS idx_conversations_deleted_at ON conversations (deleted_at);
    CREATE TABLE IF NOT EXISTS chat_messages (
        seq BIGSERIAL PRIMARY KEY,
        id TEXT NOT NULL UNIQUE,
        conversation_id TEXT NOT NULL,
        role TEXT NOT NULL,
        content TEXT NOT NULL,
        timestamp BIGINT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_chat_messages_conversation_id ON chat_messages (conversation_id);
";

const MAX_POOL_SIZE: usize = 16;

/// PostgreSQL-backed conversation store
#[derive(Clone)]
pub struct PostgresStore {
    pool: Pool,
}

impl PostgresStore {
    /// Connect using a `postgres://` URL and create missing tables
    pub async fn connect(database_url: &str) -> Result<Self> {
        let config: tokio_postgres::Config = database_url.parse()?;

        let manager_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let manager = Manager::from_config(config, NoTls, manager_config);

        let pool = Pool::builder(manager)
            .max_size(MAX_POOL_SIZE)
            .runtime(Runtime::Tokio1)
            .build()?;

        let client = pool.get().await?;
        client.batch_execute(SCHEMA).await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl ConversationStore for PostgresStore {
    async fn insert_message(&self, message: &ChatMessage) -> Result<()> {
        let client = self.pool.get().await?;
        client
            .execute(
                "INSERT INTO chat_messages (id, conversation_id, role, content, timestamp) \
                 VALUES ($1, $2, $3, $4, $5)",
                &[
                    &message.id,
                    &message.conversation_id,
                    &message.role.as_str(),
                    &message.content,
                    &message.timestamp,
                ],
            )
            .await?;
        Ok(())
    }

    async fn upsert_conversation(&self, upsert: &ConversationUpsert) -> Result<UpsertOutcome> {
        let client = self.pool.get().await?;

        let existing = client
            .query_opt("SELECT id FROM conversations WHERE id = $1", &[&upsert.id])
            .await?;

        if existing.is_none() {
            let inserted = client
                .execute(
                    "INSERT INTO conversations (id, title, provider, model, created_at, updated_at) \
                     VALUES ($1, '', $2, $3, $4, $4) ON CONFLICT (id) DO NOTHING",
                    &[&upsert.id, &upsert.provider, &upsert.model, &upsert.at],
                )
                .await?;
            if inserted == 1 {
                return Ok(UpsertOutcome::Created);
            }
        }

        client
            .execute(
                "UPDATE conversations SET model = $1, updated_at = $2 WHERE id = $3",
                &[&upsert.model, &upsert.at, &upsert.id],
            )
            .await?;
        Ok(UpsertOutcome::Updated)
    }

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT id, title, provider, model, created_at, updated_at \
                 FROM conversations WHERE id = $1 AND deleted_at IS NULL",
                &[&id],
            )
            .await?;

        row.map(|row| conversation_from_row(&row)).transpose()
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<ChatMessage>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                "SELECT id, conversation_id, role, content, timestamp \
                 FROM chat_messages WHERE conversation_id = $1 ORDER BY seq",
                &[&conversation_id],
            )
            .await?;

        rows.iter().map(message_from_row).collect()
    }

    async fn ping(&self) -> Result<()> {
        let client = self.pool.get().await?;
        client.simple_query("SELECT 1").await?;
        Ok(())
    }
}

fn conversation_from_row(row: &Row) -> Result<Conversation> {
    Ok(Conversation {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        provider: row.try_get("provider")?,
        model: row.try_get("model")?,
        created_at: row.try_get::<_, DateTime<Utc>>("created_at")?,
        updated_at: row.try_get::<_, DateTime<Utc>>("updated_at")?,
    })
}

fn message_from_row(row: &Row) -> Result<ChatMessage> {
    let role: String = row.try_get("role")?;
    Ok(ChatMessage {
        id: row.try_get("id")?,
        conversation_id: row.try_get("conversation_id")?,
        role: role.parse::<Role>().map_err(StoreError::CorruptRow)?,
        content: row.try_get("content")?,
        timestamp: row.try_get("timestamp")?,
    })
}
