//! In-memory repositories

mod knowledge;
mod messages;
mod personas;
mod settings;

pub use knowledge::InMemoryKnowledgeRepository;
pub use messages::InMemoryMessageStore;
pub use personas::InMemoryPersonaRepository;
pub use settings::InMemorySettingsRepository;
