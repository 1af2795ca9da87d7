//! Domain Entities
//!
//! Pure domain models without infrastructure dependencies.
//! - Message: One persisted conversation turn
//! - Persona: The configurable AI character and its traits
//! - KnowledgeState: Durable facts distilled from conversation
//! - GlobalSettings: Shared configuration read by every track

mod knowledge;
mod message;
mod persona;
mod settings;

pub use knowledge::*;
pub use message::*;
pub use persona::*;
pub use settings::*;
