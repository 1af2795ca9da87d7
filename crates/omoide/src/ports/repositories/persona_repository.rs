//! Persona Repository Port
//!
//! Abstract interface for Persona persistence operations.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{errors::DomainError, Persona};

/// Repository interface for Persona entities
#[async_trait]
pub trait PersonaRepository: Send + Sync {
    /// Find a Persona by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Persona>, DomainError>;

    /// Find all Personas owned by a user
    async fn find_by_user(&self, user_id: &str) -> Result<Vec<Persona>, DomainError>;

    /// Save a Persona (insert or update)
    async fn save(&self, persona: &Persona) -> Result<Persona, DomainError>;

    /// Delete a Persona by ID
    async fn delete(&self, id: Uuid) -> Result<bool, DomainError>;
}
