//! Domain Services
//!
//! Pure functions over domain entities. Nothing here performs I/O.

pub mod composer;
pub mod merger;
pub mod segmenter;
pub mod transcript;

pub use composer::{compose_instruction, PromptContext};
pub use merger::{merge_extraction, merge_relations, merge_self_narrative};
pub use segmenter::{pacing_delay, split_sentences};
pub use transcript::{numbered_transcript, speaker_transcript};
