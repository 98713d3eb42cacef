//! SQLite implementation of [`ConversationStore`]
//!
//! Timestamps are stored as RFC 3339 text. Runtime-checked `sqlx::query` is
//! used so no database is needed at compile time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::models::{ChatMessage, Conversation, Role};

use super::{ConversationStore, ConversationUpsert, Result, StoreError, UpsertOutcome};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS conversations (
        id TEXT PRIMARY KEY NOT NULL,
        title TEXT NOT NULL DEFAULT '',
        provider TEXT NOT NULL,
        model TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        deleted_at TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_conversations_deleted_at ON conversations (deleted_at)",
    "CREATE TABLE IF NOT EXISTS chat_messages (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        conversation_id TEXT NOT NULL,
        role TEXT NOT NULL,
        content TEXT NOT NULL,
        timestamp INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_chat_messages_conversation_id ON chat_messages (conversation_id)",
];

type ConversationRow = (String, String, String, String, String, String);
type MessageRow = (String, String, String, String, i64);

/// SQLite-backed conversation store
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database file at `path` and create missing tables
    pub async fn connect(path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, creating missing tables
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        Ok(Self { pool })
    }
}

#[async_trait]
impl ConversationStore for SqliteStore {
    async fn insert_message(&self, message: &ChatMessage) -> Result<()> {
        sqlx::query(
            "INSERT INTO chat_messages (id, conversation_id, role, content, timestamp) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&message.id)
        .bind(&message.conversation_id)
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(message.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upsert_conversation(&self, upsert: &ConversationUpsert) -> Result<UpsertOutcome> {
        let at = upsert.at.to_rfc3339();

        let existing: Option<(String,)> =
            sqlx::query_as("SELECT id FROM conversations WHERE id = ?1")
                .bind(&upsert.id)
                .fetch_optional(&self.pool)
                .await?;

        if existing.is_none() {
            let inserted = sqlx::query(
                "INSERT INTO conversations (id, title, provider, model, created_at, updated_at) \
                 VALUES (?1, '', ?2, ?3, ?4, ?4) ON CONFLICT(id) DO NOTHING",
            )
            .bind(&upsert.id)
            .bind(&upsert.provider)
            .bind(&upsert.model)
            .bind(&at)
            .execute(&self.pool)
            .await?;
            if inserted.rows_affected() == 1 {
                return Ok(UpsertOutcome::Created);
            }
            // Lost a create race; the row exists now.
        }

        sqlx::query("UPDATE conversations SET model = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(&upsert.model)
            .bind(&at)
            .bind(&upsert.id)
            .execute(&self.pool)
            .await?;
        Ok(UpsertOutcome::Updated)
    }

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>> {
        let row: Option<ConversationRow> = sqlx::query_as(
            "SELECT id, title, provider, model, created_at, updated_at \
             FROM conversations WHERE id = ?1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(id, title, provider, model, created_at, updated_at)| {
            Ok(Conversation {
                id,
                title,
                provider,
                model,
                created_at: parse_timestamp(&created_at)?,
                updated_at: parse_timestamp(&updated_at)?,
            })
        })
        .transpose()
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<ChatMessage>> {
        let rows: Vec<MessageRow> = sqlx::query_as(
            "SELECT id, conversation_id, role, content, timestamp \
             FROM chat_messages WHERE conversation_id = ?1 ORDER BY seq",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(id, conversation_id, role, content, timestamp)| {
                Ok(ChatMessage {
                    id,
                    conversation_id,
                    role: role.parse::<Role>().map_err(StoreError::CorruptRow)?,
                    content,
                    timestamp,
                })
            })
            .collect()
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .map_err(|e| StoreError::CorruptRow(format!("invalid timestamp {:?}: {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn memory_store() -> SqliteStore {
        // One connection: every new in-memory connection would see an empty database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        SqliteStore::from_pool(pool).await.unwrap()
    }

    fn upsert(id: &str, model: &str, at: DateTime<Utc>) -> ConversationUpsert {
        ConversationUpsert {
            id: id.to_string(),
            provider: "openai".to_string(),
            model: model.to_string(),
            at,
        }
    }

    #[tokio::test]
    async fn test_upsert_creates_once() {
        let store = memory_store().await;
        let created_at = Utc::now();
        let updated_at = created_at + Duration::seconds(30);

        let first = store
            .upsert_conversation(&upsert("c1", "gpt-4", created_at))
            .await
            .unwrap();
        let second = store
            .upsert_conversation(&upsert("c1", "gpt-4o", updated_at))
            .await
            .unwrap();
        assert_eq!(first, UpsertOutcome::Created);
        assert_eq!(second, UpsertOutcome::Updated);

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM conversations")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(count, 1);

        let conversation = store.get_conversation("c1").await.unwrap().unwrap();
        assert_eq!(conversation.model, "gpt-4o");
        assert_eq!(conversation.title, "");
        assert_eq!(conversation.created_at, created_at);
        assert_eq!(conversation.updated_at, updated_at);
    }

    #[tokio::test]
    async fn test_messages_round_trip_in_order() {
        let store = memory_store().await;
        let user = ChatMessage::new("c1", Role::User, "hi");
        let assistant = ChatMessage {
            timestamp: user.timestamp,
            ..ChatMessage::new("c1", Role::Assistant, "Hello")
        };
        store.insert_message(&user).await.unwrap();
        store.insert_message(&assistant).await.unwrap();

        let messages = store.list_messages("c1").await.unwrap();
        assert_eq!(messages, vec![user, assistant]);
        assert!(store.list_messages("c2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_soft_deleted_conversation_hidden() {
        let store = memory_store().await;
        store
            .upsert_conversation(&upsert("c1", "gpt-4", Utc::now()))
            .await
            .unwrap();
        sqlx::query("UPDATE conversations SET deleted_at = ?1 WHERE id = 'c1'")
            .bind(Utc::now().to_rfc3339())
            .execute(&store.pool)
            .await
            .unwrap();

        assert!(store.get_conversation("c1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_role_reported() {
        let store = memory_store().await;
        sqlx::query(
            "INSERT INTO chat_messages (id, conversation_id, role, content, timestamp) \
             VALUES ('m1', 'c1', 'robot', 'beep', 0)",
        )
        .execute(&store.pool)
        .await
        .unwrap();

        let err = store.list_messages("c1").await.unwrap_err();
        assert!(matches!(err, StoreError::CorruptRow(_)));
    }

    #[tokio::test]
    async fn test_ping() {
        let store = memory_store().await;
        assert!(store.ping().await.is_ok());
    }
}
