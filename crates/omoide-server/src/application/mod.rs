//! Application Layer (Use Cases)
//!
//! Server-side use cases. Chat orchestration lives in the `omoide`
//! library; persona management is wired here.

mod persona_service;

pub use persona_service::PersonaService;
