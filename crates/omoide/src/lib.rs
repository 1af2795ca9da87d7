//! Omoide Domain Library
//!
//! Core domain types and the memory pipeline for the Omoide persona chat system.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain/`): Pure business entities and logic
//!   - `entities/`: Core domain models (Persona, Message, KnowledgeState, GlobalSettings)
//!   - `value_objects/`: Immutable value types (Sender, VerbosityBand)
//!   - `services/`: Pure functions (merger, prompt composer, segmenter, transcript)
//!   - `errors/`: Domain-specific error types
//!
//! - **Ports** (`ports/`): Abstract interfaces (traits)
//!   - `repositories/`: Data access interfaces
//!   - `services/`: External service interfaces (text generation)
//!
//! - **Application** (`application/`): Use cases wiring ports together
//!   (extraction tracks, chat turns, cached configuration, session liveness)
//!
//! - **Adapters** (`adapters/`): In-memory port implementations
//!
//! # Usage
//!
//! ```rust,ignore
//! use omoide::application::{ChatService, ConfigService};
//! use omoide::adapters::InMemoryMessageStore;
//! ```

pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    CharacterProfile, ConversationKey, DomainError, GlobalSettings, KnowledgeState, Message,
    MessageCursor, MessagePage, Persona, PersonaIdentity, PersonaRelation, PersonaTraits,
    RelationCounter, Sender, TraitCatalog, TraitCategory, UserRelation, VerbosityBand,
};
pub use ports::{
    ChatMessage,
    CompletionOptions,
    CompletionResponse,
    // Repositories
    KnowledgeRepository,
    // Services
    LlmProvider,
    MessageRepository,
    MessageRole,
    MessageSubscription,
    PersonaRepository,
    SettingsRepository,
    TokenUsage,
};
