//! PostgreSQL implementation of MessageRepository.
//!
//! Rows are ordered by the `seq` identity column, which follows insertion
//! order even when timestamps collide.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::chat::{Category, Message, MessageRole};
use crate::domain::foundation::{DomainError, ErrorCode, MessageId, ThreadId, Timestamp};
use crate::ports::MessageRepository;

/// PostgreSQL implementation of MessageRepository.
#[derive(Clone)]
pub struct PostgresMessageRepository {
    pool: PgPool,
}

impl PostgresMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: Uuid,
    thread_id: Uuid,
    role: String,
    body: String,
    category: Option<String>,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageRow> for Message {
    type Error = DomainError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        let role: MessageRole = row.role.parse().map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid role: {}", e))
        })?;
        // Unknown labels written by older deployments read as general.
        let category = row.category.as_deref().map(Category::from_label_or_general);

        Ok(Message::reconstitute(
            MessageId::from_uuid(row.id),
            ThreadId::from_uuid(row.thread_id),
            role,
            row.body,
            category,
            row.deleted_at.map(Timestamp::from_datetime),
            Timestamp::from_datetime(row.created_at),
        ))
    }
}

#[async_trait]
impl MessageRepository for PostgresMessageRepository {
    async fn append(&self, message: &Message) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO chat_messages (
                id, thread_id, role, body, category, deleted_at, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(message.id().as_uuid())
        .bind(message.thread_id().as_uuid())
        .bind(message.role().as_str())
        .bind(message.body())
        .bind(message.category().map(|c| c.as_str()))
        .bind(message.deleted_at().map(|t| *t.as_datetime()))
        .bind(message.created_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to insert message: {}", e)))?;

        Ok(())
    }

    async fn list_by_thread(&self, thread_id: &ThreadId) -> Result<Vec<Message>, DomainError> {
        let rows: Vec<MessageRow> = sqlx::query_as(
            r#"
            SELECT id, thread_id, role, body, category, deleted_at, created_at
            FROM chat_messages
            WHERE thread_id = $1 AND deleted_at IS NULL
            ORDER BY seq ASC
            "#,
        )
        .bind(thread_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list messages: {}", e)))?;

        rows.into_iter().map(Message::try_from).collect()
    }

    async fn latest_uncategorized_user_message(
        &self,
        thread_id: &ThreadId,
    ) -> Result<Option<Message>, DomainError> {
        let row: Option<MessageRow> = sqlx::query_as(
            r#"
            SELECT id, thread_id, role, body, category, deleted_at, created_at
            FROM chat_messages
            WHERE thread_id = $1
              AND role = 'user'
              AND category IS NULL
              AND deleted_at IS NULL
            ORDER BY seq DESC
            LIMIT 1
            "#,
        )
        .bind(thread_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::database(format!("Failed to fetch uncategorized message: {}", e))
        })?;

        row.map(Message::try_from).transpose()
    }

    async fn set_category_if_absent(
        &self,
        message_id: &MessageId,
        category: Category,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            "UPDATE chat_messages SET category = $2 WHERE id = $1 AND category IS NULL",
        )
        .bind(message_id.as_uuid())
        .bind(category.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to set category: {}", e)))?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM chat_messages WHERE id = $1)")
                .bind(message_id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::database(format!("Failed to check message existence: {}", e))
                })?;

        if exists.0 {
            Ok(false)
        } else {
            Err(DomainError::new(
                ErrorCode::MessageNotFound,
                format!("Message not found: {}", message_id),
            ))
        }
    }

    async fn soft_delete_for_thread(&self, thread_id: &ThreadId) -> Result<u64, DomainError> {
        let result = sqlx::query(
            "UPDATE chat_messages SET deleted_at = $2 WHERE thread_id = $1 AND deleted_at IS NULL",
        )
        .bind(thread_id.as_uuid())
        .bind(Timestamp::now().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to delete messages: {}", e)))?;

        Ok(result.rows_affected())
    }
}
