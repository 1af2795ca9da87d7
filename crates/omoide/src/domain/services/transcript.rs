//! Transcript rendering
//!
//! Speaker-labeled text handed to the knowledge extractor.

use crate::domain::entities::Message;
use crate::domain::value_objects::Sender;

/// Label used for the human side of the conversation
pub const USER_LABEL: &str = "User";

fn label<'a>(message: &Message, persona_name: &'a str) -> &'a str {
    match message.sender {
        Sender::User => USER_LABEL,
        Sender::Ai => persona_name,
    }
}

/// `"<speaker>: <text>"` lines joined by newline
pub fn speaker_transcript(messages: &[Message], persona_name: &str) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", label(m, persona_name), m.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Numbered variant: `"1. <speaker>: <text>"`
pub fn numbered_transcript(messages: &[Message], persona_name: &str) -> String {
    messages
        .iter()
        .enumerate()
        .map(|(i, m)| format!("{}. {}: {}", i + 1, label(m, persona_name), m.text))
        .collect::<Vec<_>>()
        .join("\n")
}
