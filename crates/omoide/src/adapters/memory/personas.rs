//! In-memory PersonaRepository

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{errors::DomainError, Persona};
use crate::ports::PersonaRepository;

#[derive(Default)]
pub struct InMemoryPersonaRepository {
    personas: RwLock<HashMap<Uuid, Persona>>,
}

impl InMemoryPersonaRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersonaRepository for InMemoryPersonaRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Persona>, DomainError> {
        Ok(self.personas.read().await.get(&id).cloned())
    }

    async fn find_by_user(&self, user_id: &str) -> Result<Vec<Persona>, DomainError> {
        let mut owned: Vec<Persona> = self
            .personas
            .read()
            .await
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn save(&self, persona: &Persona) -> Result<Persona, DomainError> {
        self.personas
            .write()
            .await
            .insert(persona.id, persona.clone());
        Ok(persona.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        Ok(self.personas.write().await.remove(&id).is_some())
    }
}
