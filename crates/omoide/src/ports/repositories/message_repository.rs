//! Message Repository Port
//!
//! Append-only, time-ordered conversation log with backward pagination and
//! full-snapshot subscriptions.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::domain::{
    errors::DomainError, ConversationKey, Message, MessageCursor, MessagePage, Sender,
};

/// Repository interface for conversation messages
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Persist a turn with a store-assigned, strictly increasing timestamp
    async fn append(
        &self,
        key: &ConversationKey,
        sender: Sender,
        text: &str,
    ) -> Result<Message, DomainError>;

    /// Latest `limit` messages, oldest first
    async fn recent(&self, key: &ConversationKey, limit: usize)
        -> Result<Vec<Message>, DomainError>;

    /// Up to `limit` messages strictly older than `cursor`, oldest first
    async fn more(
        &self,
        key: &ConversationKey,
        cursor: MessageCursor,
        limit: usize,
    ) -> Result<MessagePage, DomainError>;

    /// Number of messages in the conversation
    async fn count(&self, key: &ConversationKey) -> Result<usize, DomainError>;

    /// Live view of the conversation, see [`MessageSubscription`]
    async fn subscribe(&self, key: &ConversationKey) -> Result<MessageSubscription, DomainError>;
}

/// Live query over one conversation.
///
/// Every delivery is the **full current ordered set**, never a delta.
/// A slow consumer may miss intermediate snapshots and only observe the
/// latest one, so consumers must diff against their previous view.
pub struct MessageSubscription {
    rx: watch::Receiver<Vec<Message>>,
    primed: bool,
}

impl MessageSubscription {
    pub fn new(rx: watch::Receiver<Vec<Message>>) -> Self {
        Self { rx, primed: false }
    }

    /// The first call returns the current set immediately; later calls wait
    /// for the next change. `None` once the store side is gone.
    pub async fn next(&mut self) -> Option<Vec<Message>> {
        if !self.primed {
            self.primed = true;
            return Some(self.rx.borrow_and_update().clone());
        }
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}
