//! Text-generation port
//!
//! One completion per call, no streaming. The chat reply and both
//! extraction calls go through the same trait and differ only in the
//! instruction they put first.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;
use crate::domain::{Message, Sender};

/// Who a prompt line is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// A stored conversation turn; the persona's own lines become
    /// assistant turns
    pub fn from_turn(message: &Message) -> Self {
        let role = match message.sender {
            Sender::User => MessageRole::User,
            Sender::Ai => MessageRole::Assistant,
        };
        Self {
            role,
            content: message.text.clone(),
        }
    }
}

/// Per-call knobs, taken from `GlobalSettings`. `None` leaves the choice to
/// the provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionOptions {
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// May be empty; callers decide what an empty reply means
    pub content: String,
    /// Model that actually answered
    pub model: String,
    pub usage: TokenUsage,
}

/// Zero when the provider does not report usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete an ordered, role-tagged message list. Any transport or
    /// provider error is a `GenerationFailure`.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, DomainError>;

    /// Short label for logs
    fn provider_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_persona_turns_become_assistant_lines() {
        let said = Message::new(Sender::Ai, "I like tea.", Utc::now());
        assert_eq!(
            ChatMessage::from_turn(&said),
            ChatMessage {
                role: MessageRole::Assistant,
                content: "I like tea.".to_string(),
            }
        );

        let asked = Message::new(Sender::User, "Do you?", Utc::now());
        assert_eq!(ChatMessage::from_turn(&asked).role, MessageRole::User);
    }
}
