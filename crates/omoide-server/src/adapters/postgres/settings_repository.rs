//! PostgreSQL implementation of SettingsRepository

use async_trait::async_trait;
use sqlx::PgPool;

use omoide::{DomainError, GlobalSettings, SettingsRepository};

/// Reads the single `global_settings` row. Missing keys take their defaults.
pub struct PgSettingsRepository {
    pool: PgPool,
}

impl PgSettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepository for PgSettingsRepository {
    async fn fetch(&self) -> Result<GlobalSettings, DomainError> {
        let value = sqlx::query_scalar::<_, serde_json::Value>(
            "SELECT settings FROM global_settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(DomainError::store)?;

        match value {
            Some(value) => serde_json::from_value(value).map_err(|e| {
                DomainError::Validation(format!("global_settings row is malformed: {}", e))
            }),
            None => Ok(GlobalSettings::default()),
        }
    }
}
