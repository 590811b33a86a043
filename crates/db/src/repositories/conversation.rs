use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use triage_core::domain::{
    Conversation, ConversationId, Message, MessageId, MessageRole, UserId,
};

use super::order::decode_timestamp;
use super::{ConversationRepository, RepositoryError};
use crate::DbPool;

pub struct SqlConversationRepository {
    pool: DbPool,
}

impl SqlConversationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ConversationRepository for SqlConversationRepository {
    async fn find_by_id(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, user_id, title, created_at FROM conversations WHERE id = ?1",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| decode_conversation(&row)).transpose()
    }

    async fn latest_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, user_id, title, created_at FROM conversations \
             WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC LIMIT 1",
        )
        .bind(&user_id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| decode_conversation(&row)).transpose()
    }

    async fn recent_for_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, user_id, title, created_at FROM conversations \
             WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC LIMIT ?2",
        )
        .bind(&user_id.0)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(decode_conversation).collect()
    }

    async fn create(&self, conversation: Conversation) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO conversations (id, user_id, title, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&conversation.id.0)
        .bind(&conversation.user_id.0)
        .bind(&conversation.title)
        .bind(conversation.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn append_message(&self, message: Message) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO messages (id, conversation_id, role, content, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&message.id.0)
        .bind(&message.conversation_id.0)
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(message.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn recent_messages(
        &self,
        conversation_id: &ConversationId,
        limit: u32,
    ) -> Result<Vec<Message>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, conversation_id, role, content, created_at FROM messages \
             WHERE conversation_id = ?1 ORDER BY created_at DESC, rowid DESC LIMIT ?2",
        )
        .bind(&conversation_id.0)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(decode_message).collect()
    }
}

fn decode_conversation(row: &SqliteRow) -> Result<Conversation, RepositoryError> {
    Ok(Conversation {
        id: ConversationId(row.get("id")),
        user_id: UserId(row.get("user_id")),
        title: row.get("title"),
        created_at: decode_timestamp(&row.get::<String, _>("created_at"))?,
    })
}

fn decode_message(row: &SqliteRow) -> Result<Message, RepositoryError> {
    let role_raw: String = row.get("role");
    let role = MessageRole::parse(&role_raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown message role `{role_raw}`")))?;

    Ok(Message {
        id: MessageId(row.get("id")),
        conversation_id: ConversationId(row.get("conversation_id")),
        role,
        content: row.get("content"),
        created_at: decode_timestamp(&row.get::<String, _>("created_at"))?,
    })
}
