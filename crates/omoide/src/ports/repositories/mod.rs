//! Repository Ports
//!
//! Abstract interfaces for data persistence operations.

mod knowledge_repository;
mod message_repository;
mod persona_repository;
mod settings_repository;

pub use knowledge_repository::*;
pub use message_repository::*;
pub use persona_repository::*;
pub use settings_repository::*;
