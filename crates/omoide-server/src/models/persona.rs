//! Persona DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use omoide::{KnowledgeState, Persona, PersonaTraits};

/// Identifies the calling user
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    pub user_id: String,
}

/// Create Persona request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePersonaRequest {
    pub user_id: String,
    pub name: String,
    /// Omitted traits get the configured default verbosity
    #[schema(value_type = Option<Object>)]
    pub traits: Option<PersonaTraits>,
}

/// Update Persona request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePersonaRequest {
    pub user_id: String,
    pub name: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub traits: Option<PersonaTraits>,
}

/// Persona response
#[derive(Debug, Serialize, ToSchema)]
pub struct PersonaResponse {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    #[schema(value_type = Object)]
    pub traits: PersonaTraits,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Persona> for PersonaResponse {
    fn from(persona: Persona) -> Self {
        Self {
            id: persona.id,
            user_id: persona.user_id,
            name: persona.name,
            traits: persona.traits,
            created_at: persona.created_at,
            updated_at: persona.updated_at,
        }
    }
}

/// Merged knowledge of one conversation
#[derive(Debug, Serialize, ToSchema)]
pub struct KnowledgeResponse {
    pub persona_id: Uuid,
    pub user_id: String,
    #[schema(value_type = Object)]
    pub knowledge: KnowledgeState,
}
