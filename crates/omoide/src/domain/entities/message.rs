//! Message Entity
//!
//! An immutable conversation turn, ordered by its store-assigned timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::value_objects::Sender;

/// Identifies one conversation log: a user talking to one persona
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationKey {
    pub user_id: String,
    pub persona_id: Uuid,
}

impl ConversationKey {
    pub fn new(user_id: impl Into<String>, persona_id: Uuid) -> Self {
        Self {
            user_id: user_id.into(),
            persona_id,
        }
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user_id, self.persona_id)
    }
}

/// A persisted conversation turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub sender: Sender,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a message with a store-assigned timestamp
    pub fn new(sender: Sender, text: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            text: text.into(),
            created_at,
        }
    }
}

/// Pagination cursor: the timestamp of the oldest message already shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageCursor(pub DateTime<Utc>);

impl MessageCursor {
    /// Cursor pointing just before the oldest message of a page
    pub fn before(messages: &[Message]) -> Option<Self> {
        messages.first().map(|m| Self(m.created_at))
    }
}

/// One page of backward pagination
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagePage {
    /// Messages in ascending time order
    pub messages: Vec<Message>,
    /// Cursor for the next (older) page, `None` when nothing older was returned
    pub cursor: Option<MessageCursor>,
}

impl MessagePage {
    pub fn new(messages: Vec<Message>) -> Self {
        let cursor = MessageCursor::before(&messages);
        Self { messages, cursor }
    }
}
