//! Adapters
//!
//! In-process implementations of the repository ports. Used by tests and
//! by embedders that do not need durable storage.

pub mod memory;

pub use memory::{
    InMemoryKnowledgeRepository, InMemoryMessageStore, InMemoryPersonaRepository,
    InMemorySettingsRepository,
};
