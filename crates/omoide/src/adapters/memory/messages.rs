//! In-memory MessageRepository

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{watch, RwLock};

use crate::domain::{
    errors::DomainError, ConversationKey, Message, MessageCursor, MessagePage, Sender,
};
use crate::ports::{MessageRepository, MessageSubscription};

struct Conversation {
    messages: Vec<Message>,
    tx: watch::Sender<Vec<Message>>,
}

impl Conversation {
    fn new() -> Self {
        let (tx, _) = watch::channel(Vec::new());
        Self {
            messages: Vec::new(),
            tx,
        }
    }
}

/// Message log kept in process memory.
///
/// Timestamps are strictly increasing per conversation even when appends
/// land within the same clock tick. `set_available(false)` makes every call
/// fail with `StoreUnavailable`.
pub struct InMemoryMessageStore {
    conversations: RwLock<HashMap<ConversationKey, Conversation>>,
    available: AtomicBool,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self {
            conversations: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), DomainError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DomainError::StoreUnavailable(
                "message store is offline".to_string(),
            ))
        }
    }
}

impl Default for InMemoryMessageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageStore {
    async fn append(
        &self,
        key: &ConversationKey,
        sender: Sender,
        text: &str,
    ) -> Result<Message, DomainError> {
        self.check()?;

        let mut conversations = self.conversations.write().await;
        let conversation = conversations
            .entry(key.clone())
            .or_insert_with(Conversation::new);

        let mut created_at = Utc::now();
        if let Some(last) = conversation.messages.last() {
            if created_at <= last.created_at {
                created_at = last.created_at + Duration::microseconds(1);
            }
        }

        let message = Message::new(sender, text, created_at);
        conversation.messages.push(message.clone());
        conversation.tx.send_replace(conversation.messages.clone());

        tracing::debug!(conversation = %key, sender = %sender, "Message appended");
        Ok(message)
    }

    async fn recent(
        &self,
        key: &ConversationKey,
        limit: usize,
    ) -> Result<Vec<Message>, DomainError> {
        self.check()?;

        let conversations = self.conversations.read().await;
        Ok(conversations
            .get(key)
            .map(|c| {
                let start = c.messages.len().saturating_sub(limit);
                c.messages[start..].to_vec()
            })
            .unwrap_or_default())
    }

    async fn more(
        &self,
        key: &ConversationKey,
        cursor: MessageCursor,
        limit: usize,
    ) -> Result<MessagePage, DomainError> {
        self.check()?;

        let conversations = self.conversations.read().await;
        let older: Vec<Message> = conversations
            .get(key)
            .map(|c| {
                let end = c.messages.partition_point(|m| m.created_at < cursor.0);
                let start = end.saturating_sub(limit);
                c.messages[start..end].to_vec()
            })
            .unwrap_or_default();

        Ok(MessagePage::new(older))
    }

    async fn count(&self, key: &ConversationKey) -> Result<usize, DomainError> {
        self.check()?;

        let conversations = self.conversations.read().await;
        Ok(conversations.get(key).map_or(0, |c| c.messages.len()))
    }

    async fn subscribe(&self, key: &ConversationKey) -> Result<MessageSubscription, DomainError> {
        self.check()?;

        let mut conversations = self.conversations.write().await;
        let conversation = conversations
            .entry(key.clone())
            .or_insert_with(Conversation::new);
        Ok(MessageSubscription::new(conversation.tx.subscribe()))
    }
}
