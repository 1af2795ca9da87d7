//! Infrastructure Adapters
//!
//! Implementations of domain ports for external systems.

pub mod llm;
pub mod postgres;

// Re-exports
pub use llm::OpenAiCompatProvider;
pub use postgres::{
    PgKnowledgeRepository, PgMessageStore, PgPersonaRepository, PgSettingsRepository,
};
