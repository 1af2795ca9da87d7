//! PostgreSQL Repository Implementations

mod knowledge_repository;
mod message_repository;
mod persona_repository;
mod settings_repository;

pub use knowledge_repository::PgKnowledgeRepository;
pub use message_repository::PgMessageStore;
pub use persona_repository::PgPersonaRepository;
pub use settings_repository::PgSettingsRepository;
