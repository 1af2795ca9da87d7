//! PostgreSQL implementation of PersonaRepository

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use omoide::{DomainError, Persona, PersonaRepository};

/// PostgreSQL implementation of PersonaRepository
pub struct PgPersonaRepository {
    pool: PgPool,
}

impl PgPersonaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Internal row type for sqlx mapping
#[derive(sqlx::FromRow)]
struct PersonaRow {
    id: Uuid,
    user_id: String,
    name: String,
    traits: serde_json::Value,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<PersonaRow> for Persona {
    type Error = DomainError;

    fn try_from(row: PersonaRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            traits: serde_json::from_value(row.traits).map_err(DomainError::store)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl PersonaRepository for PgPersonaRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Persona>, DomainError> {
        let row = sqlx::query_as::<_, PersonaRow>("SELECT * FROM personas WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DomainError::store)?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_by_user(&self, user_id: &str) -> Result<Vec<Persona>, DomainError> {
        let rows = sqlx::query_as::<_, PersonaRow>(
            "SELECT * FROM personas WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DomainError::store)?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn save(&self, persona: &Persona) -> Result<Persona, DomainError> {
        let traits = serde_json::to_value(&persona.traits).map_err(DomainError::store)?;

        // Check if exists
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM personas WHERE id = $1)")
                .bind(persona.id)
                .fetch_one(&self.pool)
                .await
                .map_err(DomainError::store)?;

        let row = if exists {
            sqlx::query_as::<_, PersonaRow>(
                r#"
                UPDATE personas
                SET name = $2, traits = $3, updated_at = NOW()
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(persona.id)
            .bind(&persona.name)
            .bind(&traits)
            .fetch_one(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, PersonaRow>(
                r#"
                INSERT INTO personas (id, user_id, name, traits, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
                "#,
            )
            .bind(persona.id)
            .bind(&persona.user_id)
            .bind(&persona.name)
            .bind(&traits)
            .bind(persona.created_at)
            .bind(persona.updated_at)
            .fetch_one(&self.pool)
            .await
        }
        .map_err(DomainError::store)?;

        row.try_into()
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM personas WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DomainError::store)?;

        Ok(result.rows_affected() > 0)
    }
}
