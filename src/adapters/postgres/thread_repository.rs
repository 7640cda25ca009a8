//! PostgreSQL implementation of ThreadRepository.
//!
//! Soft-deleted rows stay in `chat_threads` but are invisible to every read.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::chat::Thread;
use crate::domain::foundation::{
    AssistantId, DomainError, ErrorCode, ProviderThreadHandle, ThreadId, Timestamp, UserId,
};
use crate::ports::ThreadRepository;

/// PostgreSQL implementation of ThreadRepository.
#[derive(Clone)]
pub struct PostgresThreadRepository {
    pool: PgPool,
}

impl PostgresThreadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ThreadRow {
    id: Uuid,
    user_id: String,
    assistant_id: String,
    provider_handle: String,
    name: Option<String>,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ThreadRow> for Thread {
    type Error = DomainError;

    fn try_from(row: ThreadRow) -> Result<Self, Self::Error> {
        let corrupt = |field: &str, e: String| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid {}: {}", field, e))
        };
        Ok(Thread::reconstitute(
            ThreadId::from_uuid(row.id),
            UserId::new(row.user_id).map_err(|e| corrupt("user_id", e.to_string()))?,
            AssistantId::new(row.assistant_id).map_err(|e| corrupt("assistant_id", e.to_string()))?,
            ProviderThreadHandle::new(row.provider_handle)
                .map_err(|e| corrupt("provider_handle", e.to_string()))?,
            row.name,
            row.deleted_at.map(Timestamp::from_datetime),
            Timestamp::from_datetime(row.created_at),
            Timestamp::from_datetime(row.updated_at),
        ))
    }
}

const SELECT_THREAD: &str = r#"
    SELECT id, user_id, assistant_id, provider_handle, name,
           deleted_at, created_at, updated_at
    FROM chat_threads
"#;

#[async_trait]
impl ThreadRepository for PostgresThreadRepository {
    async fn save(&self, thread: &Thread) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO chat_threads (
                id, user_id, assistant_id, provider_handle, name,
                deleted_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(thread.id().as_uuid())
        .bind(thread.user_id().as_str())
        .bind(thread.assistant_id().as_str())
        .bind(thread.provider_handle().as_str())
        .bind(thread.name())
        .bind(thread.deleted_at().map(|t| *t.as_datetime()))
        .bind(thread.created_at().as_datetime())
        .bind(thread.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to insert thread: {}", e)))?;

        Ok(())
    }

    async fn update(&self, thread: &Thread) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE chat_threads SET
                name = $2,
                deleted_at = $3,
                updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(thread.id().as_uuid())
        .bind(thread.name())
        .bind(thread.deleted_at().map(|t| *t.as_datetime()))
        .bind(thread.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update thread: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::ThreadNotFound,
                format!("Thread not found: {}", thread.id()),
            ));
        }

        Ok(())
    }

    async fn touch(&self, id: &ThreadId, at: Timestamp) -> Result<bool, DomainError> {
        let result = sqlx::query(
            "UPDATE chat_threads SET updated_at = $2 WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id.as_uuid())
        .bind(at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to touch thread: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_id(&self, id: &ThreadId) -> Result<Option<Thread>, DomainError> {
        let row: Option<ThreadRow> =
            sqlx::query_as(&format!("{} WHERE id = $1 AND deleted_at IS NULL", SELECT_THREAD))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("Failed to fetch thread: {}", e)))?;

        row.map(Thread::try_from).transpose()
    }

    async fn find_by_handle(
        &self,
        handle: &ProviderThreadHandle,
    ) -> Result<Option<Thread>, DomainError> {
        let row: Option<ThreadRow> = sqlx::query_as(&format!(
            "{} WHERE provider_handle = $1 AND deleted_at IS NULL",
            SELECT_THREAD
        ))
        .bind(handle.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to fetch thread by handle: {}", e)))?;

        row.map(Thread::try_from).transpose()
    }

    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Thread>, DomainError> {
        let rows: Vec<ThreadRow> = sqlx::query_as(&format!(
            "{} WHERE user_id = $1 AND deleted_at IS NULL ORDER BY updated_at DESC",
            SELECT_THREAD
        ))
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list threads: {}", e)))?;

        rows.into_iter().map(Thread::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> ThreadRow {
        let now = Utc::now();
        ThreadRow {
            id: Uuid::new_v4(),
            user_id: "user-1".into(),
            assistant_id: "asst_line_maintenance".into(),
            provider_handle: "thread_abc".into(),
            name: Some("Pack trip".into()),
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn row_converts_to_thread() {
        let thread = Thread::try_from(row()).unwrap();
        assert_eq!(thread.name(), Some("Pack trip"));
        assert_eq!(thread.provider_handle().as_str(), "thread_abc");
        assert!(!thread.is_deleted());
    }

    #[test]
    fn blank_user_id_is_database_error() {
        let mut bad = row();
        bad.user_id = String::new();
        let err = Thread::try_from(bad).unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }
}
