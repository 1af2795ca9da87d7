//! PostgreSQL implementation of MessageRepository
//!
//! Rows live in `messages`; live subscriptions are served from an
//! in-process hub that republishes the full conversation after each append.

use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use uuid::Uuid;

use omoide::{
    ConversationKey, DomainError, Message, MessageCursor, MessagePage, MessageRepository,
    MessageSubscription, Sender,
};

type Publisher = Arc<watch::Sender<Vec<Message>>>;

/// PostgreSQL implementation of MessageRepository
pub struct PgMessageStore {
    pool: PgPool,
    hub: Mutex<HashMap<ConversationKey, Publisher>>,
}

impl PgMessageStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            hub: Mutex::new(HashMap::new()),
        }
    }

    async fn load_all(&self, key: &ConversationKey) -> Result<Vec<Message>, DomainError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT * FROM messages
            WHERE user_id = $1 AND persona_id = $2
            ORDER BY created_at ASC
            "#,
        )
        .bind(&key.user_id)
        .bind(key.persona_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DomainError::store)?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Insert one row under a per-conversation advisory lock. A timestamp
    /// colliding with the latest row is bumped by one microsecond.
    async fn insert(
        &self,
        key: &ConversationKey,
        sender: Sender,
        text: &str,
    ) -> Result<MessageRow, DomainError> {
        let mut tx = self.pool.begin().await.map_err(DomainError::store)?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1 || '/' || $2::text, 0))")
            .bind(&key.user_id)
            .bind(key.persona_id)
            .execute(&mut *tx)
            .await
            .map_err(DomainError::store)?;

        let row = sqlx::query_as::<_, MessageRow>(
            r#"
            INSERT INTO messages (id, user_id, persona_id, sender, text, created_at)
            VALUES (
                $1, $2, $3, $4, $5,
                GREATEST(
                    clock_timestamp(),
                    (SELECT MAX(created_at) + INTERVAL '1 microsecond'
                     FROM messages WHERE user_id = $2 AND persona_id = $3)
                )
            )
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&key.user_id)
        .bind(key.persona_id)
        .bind(sender.as_str())
        .bind(text)
        .fetch_one(&mut *tx)
        .await
        .map_err(insert_error)?;

        tx.commit().await.map_err(insert_error)?;
        Ok(row)
    }

    /// Publisher for `key` if anyone is still listening
    fn publisher(&self, key: &ConversationKey) -> Option<Publisher> {
        let mut hub = self.hub.lock().ok()?;
        match hub.get(key) {
            Some(tx) if tx.receiver_count() > 0 => Some(tx.clone()),
            Some(_) => {
                hub.remove(key);
                None
            }
            None => None,
        }
    }

    async fn publish(&self, key: &ConversationKey) {
        let Some(tx) = self.publisher(key) else {
            return;
        };
        match self.load_all(key).await {
            Ok(snapshot) => {
                tx.send_replace(snapshot);
            }
            Err(e) => tracing::warn!(conversation = %key, "Snapshot publish failed: {}", e),
        }
    }
}

/// Unique violations on `(user_id, persona_id, created_at)` are a retryable
/// conflict; everything else means the store is unavailable
fn insert_error(e: sqlx::Error) -> DomainError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => {
            DomainError::Conflict(format!("message timestamp collision: {}", db.message()))
        }
        _ => DomainError::store(e),
    }
}

/// Internal row type for sqlx mapping
#[derive(sqlx::FromRow)]
struct MessageRow {
    id: Uuid,
    #[allow(dead_code)]
    user_id: String,
    #[allow(dead_code)]
    persona_id: Uuid,
    sender: String,
    text: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<MessageRow> for Message {
    type Error = DomainError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            sender: row.sender.parse::<Sender>().map_err(DomainError::store)?,
            text: row.text,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl MessageRepository for PgMessageStore {
    async fn append(
        &self,
        key: &ConversationKey,
        sender: Sender,
        text: &str,
    ) -> Result<Message, DomainError> {
        let row = match self.insert(key, sender, text).await {
            Err(DomainError::Conflict(reason)) => {
                tracing::debug!(conversation = %key, "Retrying append after {}", reason);
                self.insert(key, sender, text).await?
            }
            other => other?,
        };

        let message: Message = row.try_into()?;
        self.publish(key).await;

        Ok(message)
    }

    async fn recent(
        &self,
        key: &ConversationKey,
        limit: usize,
    ) -> Result<Vec<Message>, DomainError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT * FROM (
                SELECT * FROM messages
                WHERE user_id = $1 AND persona_id = $2
                ORDER BY created_at DESC
                LIMIT $3
            ) latest
            ORDER BY created_at ASC
            "#,
        )
        .bind(&key.user_id)
        .bind(key.persona_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(DomainError::store)?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn more(
        &self,
        key: &ConversationKey,
        cursor: MessageCursor,
        limit: usize,
    ) -> Result<MessagePage, DomainError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT * FROM (
                SELECT * FROM messages
                WHERE user_id = $1 AND persona_id = $2 AND created_at < $3
                ORDER BY created_at DESC
                LIMIT $4
            ) older
            ORDER BY created_at ASC
            "#,
        )
        .bind(&key.user_id)
        .bind(key.persona_id)
        .bind(cursor.0)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(DomainError::store)?;

        let messages = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<Message>, _>>()?;
        Ok(MessagePage::new(messages))
    }

    async fn count(&self, key: &ConversationKey) -> Result<usize, DomainError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM messages WHERE user_id = $1 AND persona_id = $2",
        )
        .bind(&key.user_id)
        .bind(key.persona_id)
        .fetch_one(&self.pool)
        .await
        .map_err(DomainError::store)?;

        Ok(count as usize)
    }

    async fn subscribe(&self, key: &ConversationKey) -> Result<MessageSubscription, DomainError> {
        let snapshot = self.load_all(key).await?;

        let mut hub = self
            .hub
            .lock()
            .map_err(|_| DomainError::StoreUnavailable("subscription hub poisoned".to_string()))?;
        let tx = hub
            .entry(key.clone())
            .or_insert_with(|| Arc::new(watch::channel(Vec::new()).0));
        tx.send_replace(snapshot);

        Ok(MessageSubscription::new(tx.subscribe()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::fmt;

    /// Database error that is a unique violation when the flag is set
    #[derive(Debug)]
    struct FakeDbError(bool);

    impl fmt::Display for FakeDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("duplicate key value violates unique constraint")
        }
    }

    impl std::error::Error for FakeDbError {}

    impl DatabaseError for FakeDbError {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            None
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            if self.0 {
                ErrorKind::UniqueViolation
            } else {
                ErrorKind::Other
            }
        }
    }

    #[test]
    fn test_timestamp_collision_is_a_conflict() {
        let err = sqlx::Error::Database(Box::new(FakeDbError(true)));
        assert!(matches!(insert_error(err), DomainError::Conflict(_)));
    }

    #[test]
    fn test_other_failures_are_store_unavailable() {
        let err = sqlx::Error::Database(Box::new(FakeDbError(false)));
        assert!(matches!(insert_error(err), DomainError::StoreUnavailable(_)));
        assert!(matches!(
            insert_error(sqlx::Error::PoolTimedOut),
            DomainError::StoreUnavailable(_)
        ));
    }
}
