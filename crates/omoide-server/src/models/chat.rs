//! Chat DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use omoide::{Message, MessagePage};

/// Message author on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SenderDto {
    User,
    Ai,
}

/// A persisted conversation turn
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub id: Uuid,
    pub sender: SenderDto,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            sender: match message.sender {
                omoide::Sender::User => SenderDto::User,
                omoide::Sender::Ai => SenderDto::Ai,
            },
            text: message.text,
            created_at: message.created_at,
        }
    }
}

/// Activate a persona for a user
#[derive(Debug, Deserialize, ToSchema)]
pub struct OpenSessionRequest {
    pub user_id: String,
}

/// Active session info
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub user_id: String,
    pub persona_id: Uuid,
    pub persona_name: String,
}

/// Send a user message; the reply is delivered in the background
#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    pub user_id: String,
    pub text: String,
}

/// History query: latest page, or the page before `before`
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    pub user_id: String,
    /// Page size (default 20, max 100)
    pub limit: Option<usize>,
    /// Cursor from a previous page: return messages older than this
    pub before: Option<DateTime<Utc>>,
}

/// One page of history, oldest first
#[derive(Debug, Serialize, ToSchema)]
pub struct MessagePageResponse {
    pub messages: Vec<MessageResponse>,
    /// Pass as `before` to load older messages; absent when the page is empty
    pub cursor: Option<DateTime<Utc>>,
}

impl From<MessagePage> for MessagePageResponse {
    fn from(page: MessagePage) -> Self {
        Self {
            messages: page.messages.into_iter().map(Into::into).collect(),
            cursor: page.cursor.map(|c| c.0),
        }
    }
}

/// Typing indicator of the active session
#[derive(Debug, Serialize, ToSchema)]
pub struct TypingResponse {
    pub active: bool,
    pub typing: bool,
}
