//! PostgreSQL implementation of KnowledgeRepository

use async_trait::async_trait;
use sqlx::PgPool;

use omoide::{ConversationKey, DomainError, KnowledgeRepository, KnowledgeState, RelationCounter};

/// PostgreSQL implementation of KnowledgeRepository.
///
/// One `knowledge_states` row per conversation holds the JSON state and
/// the relations counter side by side.
pub struct PgKnowledgeRepository {
    pool: PgPool,
}

impl PgKnowledgeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KnowledgeRepository for PgKnowledgeRepository {
    async fn find(&self, key: &ConversationKey) -> Result<Option<KnowledgeState>, DomainError> {
        let state = sqlx::query_scalar::<_, serde_json::Value>(
            "SELECT state FROM knowledge_states WHERE user_id = $1 AND persona_id = $2",
        )
        .bind(&key.user_id)
        .bind(key.persona_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DomainError::store)?;

        state
            .map(|value| serde_json::from_value(value).map_err(DomainError::store))
            .transpose()
    }

    async fn save(&self, key: &ConversationKey, state: &KnowledgeState) -> Result<(), DomainError> {
        let value = serde_json::to_value(state).map_err(DomainError::store)?;

        sqlx::query(
            r#"
            INSERT INTO knowledge_states (user_id, persona_id, state)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, persona_id)
            DO UPDATE SET state = EXCLUDED.state, updated_at = NOW()
            "#,
        )
        .bind(&key.user_id)
        .bind(key.persona_id)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(DomainError::store)?;

        Ok(())
    }

    async fn delete(&self, key: &ConversationKey) -> Result<bool, DomainError> {
        let result =
            sqlx::query("DELETE FROM knowledge_states WHERE user_id = $1 AND persona_id = $2")
                .bind(&key.user_id)
                .bind(key.persona_id)
                .execute(&self.pool)
                .await
                .map_err(DomainError::store)?;

        Ok(result.rows_affected() > 0)
    }

    async fn load_counter(&self, key: &ConversationKey) -> Result<RelationCounter, DomainError> {
        let count = sqlx::query_scalar::<_, i32>(
            "SELECT relation_count FROM knowledge_states WHERE user_id = $1 AND persona_id = $2",
        )
        .bind(&key.user_id)
        .bind(key.persona_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DomainError::store)?;

        Ok(RelationCounter {
            count: count.unwrap_or(0).max(0) as u32,
        })
    }

    async fn save_counter(
        &self,
        key: &ConversationKey,
        counter: RelationCounter,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO knowledge_states (user_id, persona_id, relation_count)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, persona_id)
            DO UPDATE SET relation_count = EXCLUDED.relation_count, updated_at = NOW()
            "#,
        )
        .bind(&key.user_id)
        .bind(key.persona_id)
        .bind(counter.count as i32)
        .execute(&self.pool)
        .await
        .map_err(DomainError::store)?;

        Ok(())
    }
}
