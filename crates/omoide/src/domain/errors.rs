//! Domain Errors
//!
//! Error types for domain operations.

use thiserror::Error;
use uuid::Uuid;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Persistence read or write failed. Never retried automatically.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The completion call itself failed.
    #[error("Generation failed: {0}")]
    GenerationFailure(String),

    /// The completion service answered with something that is not the expected JSON.
    #[error("Extraction parse failure: {0}")]
    ExtractionParseFailure(String),
}

impl DomainError {
    pub fn not_found<T: AsRef<str>>(entity_type: T, id: Uuid) -> Self {
        Self::NotFound {
            entity_type: entity_type.as_ref().to_string(),
            id: id.to_string(),
        }
    }

    pub fn not_found_str<T: AsRef<str>>(entity_type: T, id: &str) -> Self {
        Self::NotFound {
            entity_type: entity_type.as_ref().to_string(),
            id: id.to_string(),
        }
    }

    /// Shorthand used by adapters when mapping backend errors
    pub fn store<E: std::fmt::Display>(err: E) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}
