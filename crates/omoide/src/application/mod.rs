//! Application Layer (Use Cases)
//!
//! Orchestrates domain services and coordinates between repositories and
//! the text-generation service.
//!
//! - `ConfigService`: cached global settings with TTL and invalidate
//! - `SessionRegistry`: active persona per user, liveness tokens for background work
//! - `KnowledgeExtractor`: transcript -> structured facts, never fails
//! - `SelfNarrativeTrack` / `RelationsTrack`: periodic extraction cadence
//! - `ChatService`: one conversation turn end to end

mod chat_service;
mod config_service;
mod delivery;
mod extractor;
mod relations;
mod self_narrative;
mod session;

pub use chat_service::{ChatService, Clock, ReplyOutcome, APOLOGY_MESSAGE};
pub use config_service::{ConfigService, DEFAULT_SETTINGS_TTL};
pub use delivery::deliver_reply;
pub use extractor::{strip_code_fences, KnowledgeExtractor};
pub use relations::{RelationsOutcome, RelationsTrack};
pub use self_narrative::{spawn_narrative_watcher, NarrativeCursor, SelfNarrativeTrack};
pub use session::{Session, SessionRegistry, SessionToken, TrackHandle};
