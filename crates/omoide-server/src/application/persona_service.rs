//! Persona Application Service (Use Case)
//!
//! Orchestrates persona CRUD together with the persona's knowledge row.

use std::sync::Arc;
use uuid::Uuid;

use omoide::application::ConfigService;
use omoide::{
    ConversationKey, DomainError, KnowledgeRepository, KnowledgeState, Persona,
    PersonaRepository, PersonaTraits,
};

/// Application service for Persona operations
pub struct PersonaService<P: PersonaRepository, K: KnowledgeRepository> {
    repo: Arc<P>,
    knowledge: Arc<K>,
    config: Arc<ConfigService>,
}

impl<P: PersonaRepository, K: KnowledgeRepository> PersonaService<P, K> {
    pub fn new(repo: Arc<P>, knowledge: Arc<K>, config: Arc<ConfigService>) -> Self {
        Self {
            repo,
            knowledge,
            config,
        }
    }

    /// All personas owned by a user, newest first
    pub async fn list(&self, user_id: &str) -> Result<Vec<Persona>, DomainError> {
        self.repo.find_by_user(user_id).await
    }

    /// Get a persona if it belongs to `user_id`
    pub async fn get(&self, user_id: &str, id: Uuid) -> Result<Option<Persona>, DomainError> {
        Ok(self
            .repo
            .find_by_id(id)
            .await?
            .filter(|p| p.user_id == user_id))
    }

    /// Create a persona and its empty knowledge
    pub async fn create(
        &self,
        user_id: String,
        name: String,
        traits: Option<PersonaTraits>,
    ) -> Result<Persona, DomainError> {
        let name = validate_name(&name)?;
        let settings = self.config.get().await?;

        let traits =
            traits.unwrap_or_else(|| PersonaTraits::with_verbosity(settings.default_verbosity));
        traits.validate(&settings.trait_catalog)?;

        let persona = Persona::new(user_id, name, traits);
        let saved = self.repo.save(&persona).await?;

        let key = ConversationKey::new(saved.user_id.clone(), saved.id);
        self.knowledge.save(&key, &KnowledgeState::default()).await?;

        tracing::info!("Created Persona: {} ({}) for {}", saved.name, saved.id, saved.user_id);

        Ok(saved)
    }

    /// Update name and/or traits
    pub async fn update(
        &self,
        user_id: &str,
        id: Uuid,
        name: Option<String>,
        traits: Option<PersonaTraits>,
    ) -> Result<Persona, DomainError> {
        let current = self
            .get(user_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found("Persona", id))?;

        let name = match name {
            Some(name) => validate_name(&name)?,
            None => current.name,
        };
        let traits = match traits {
            Some(traits) => {
                let settings = self.config.get().await?;
                traits.validate(&settings.trait_catalog)?;
                traits
            }
            None => current.traits,
        };

        let updated = Persona {
            id: current.id,
            user_id: current.user_id,
            name,
            traits,
            created_at: current.created_at,
            updated_at: chrono::Utc::now(),
        };

        self.repo.save(&updated).await
    }

    /// Delete a persona together with its knowledge and relation counter
    pub async fn delete(&self, user_id: &str, id: Uuid) -> Result<bool, DomainError> {
        if self.get(user_id, id).await?.is_none() {
            return Ok(false);
        }

        self.knowledge
            .delete(&ConversationKey::new(user_id, id))
            .await?;
        let deleted = self.repo.delete(id).await?;
        if deleted {
            tracing::info!("Deleted Persona: {}", id);
        }
        Ok(deleted)
    }

    /// Merged knowledge of the user's conversation with this persona
    pub async fn knowledge(&self, user_id: &str, id: Uuid) -> Result<KnowledgeState, DomainError> {
        if self.get(user_id, id).await?.is_none() {
            return Err(DomainError::not_found("Persona", id));
        }

        Ok(self
            .knowledge
            .find(&ConversationKey::new(user_id, id))
            .await?
            .unwrap_or_default())
    }
}

fn validate_name(name: &str) -> Result<String, DomainError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::Validation("persona name is empty".to_string()));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use omoide::adapters::{
        InMemoryKnowledgeRepository, InMemoryPersonaRepository, InMemorySettingsRepository,
    };
    use omoide::{GlobalSettings, TraitCatalog, TraitCategory, UserRelation};

    type Service = PersonaService<InMemoryPersonaRepository, InMemoryKnowledgeRepository>;

    fn service(settings: GlobalSettings) -> (Service, Arc<InMemoryKnowledgeRepository>) {
        let knowledge = Arc::new(InMemoryKnowledgeRepository::new());
        let config = Arc::new(ConfigService::new(Arc::new(
            InMemorySettingsRepository::new(settings),
        )));
        let service = PersonaService::new(
            Arc::new(InMemoryPersonaRepository::new()),
            knowledge.clone(),
            config,
        );
        (service, knowledge)
    }

    fn catalog() -> TraitCatalog {
        TraitCatalog {
            categories: vec![TraitCategory {
                name: "Temperament".to_string(),
                max_selections: 1,
                labels: vec!["cheerful".to_string(), "calm".to_string()],
            }],
        }
    }

    #[tokio::test]
    async fn test_create_uses_default_verbosity_and_creates_knowledge() {
        let (service, knowledge) = service(GlobalSettings {
            default_verbosity: 15,
            ..Default::default()
        });

        let persona = service
            .create("user-1".into(), "  Hana ".into(), None)
            .await
            .unwrap();

        assert_eq!(persona.name, "Hana");
        assert_eq!(persona.traits.verbosity_ratio, 15);

        let key = ConversationKey::new("user-1", persona.id);
        assert_eq!(
            knowledge.find(&key).await.unwrap(),
            Some(KnowledgeState::default())
        );
    }

    #[tokio::test]
    async fn test_create_rejects_traits_over_category_bound() {
        let (service, _) = service(GlobalSettings {
            trait_catalog: catalog(),
            ..Default::default()
        });

        let mut traits = PersonaTraits::default();
        traits.tags.insert("cheerful".to_string());
        traits.tags.insert("calm".to_string());

        let err = service
            .create("user-1".into(), "Hana".into(), Some(traits))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = service
            .create("user-1".into(), "   ".into(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn test_personas_are_scoped_to_their_owner() {
        let (service, _) = service(GlobalSettings::default());
        let persona = service
            .create("user-1".into(), "Hana".into(), None)
            .await
            .unwrap();

        assert!(service.get("user-2", persona.id).await.unwrap().is_none());
        assert!(service.list("user-2").await.unwrap().is_empty());
        assert!(!service.delete("user-2", persona.id).await.unwrap());

        let err = service
            .update("user-2", persona.id, Some("Ren".into()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_keeps_unchanged_fields() {
        let (service, _) = service(GlobalSettings::default());
        let persona = service
            .create("user-1".into(), "Hana".into(), None)
            .await
            .unwrap();

        let updated = service
            .update("user-1", persona.id, Some("Hana-chan".into()), None)
            .await
            .unwrap();

        assert_eq!(updated.name, "Hana-chan");
        assert_eq!(updated.traits, persona.traits);
        assert_eq!(updated.created_at, persona.created_at);
    }

    #[tokio::test]
    async fn test_delete_removes_knowledge_and_counter() {
        let (service, knowledge) = service(GlobalSettings::default());
        let persona = service
            .create("user-1".into(), "Hana".into(), None)
            .await
            .unwrap();
        let key = ConversationKey::new("user-1", persona.id);

        let state = KnowledgeState {
            user_relations: vec![UserRelation::new("Mom", "family")],
            ..Default::default()
        };
        knowledge.save(&key, &state).await.unwrap();
        knowledge
            .save_counter(&key, omoide::RelationCounter { count: 4 })
            .await
            .unwrap();
        assert!(service.knowledge("user-1", persona.id).await.unwrap().has_relations());

        assert!(service.delete("user-1", persona.id).await.unwrap());
        assert!(knowledge.find(&key).await.unwrap().is_none());
        assert_eq!(knowledge.load_counter(&key).await.unwrap().count, 0);
        assert!(service.get("user-1", persona.id).await.unwrap().is_none());
    }
}
