//! Knowledge Repository Port
//!
//! Persistence for merged knowledge and the relations-track counter.

use async_trait::async_trait;

use crate::domain::{errors::DomainError, ConversationKey, KnowledgeState, RelationCounter};

/// Repository interface for KnowledgeState and its cadence counter
#[async_trait]
pub trait KnowledgeRepository: Send + Sync {
    /// Load knowledge for a conversation, `None` if never created
    async fn find(&self, key: &ConversationKey) -> Result<Option<KnowledgeState>, DomainError>;

    /// Save knowledge (insert or replace)
    async fn save(&self, key: &ConversationKey, state: &KnowledgeState)
        -> Result<(), DomainError>;

    /// Remove knowledge and counter together
    async fn delete(&self, key: &ConversationKey) -> Result<bool, DomainError>;

    /// Load the relations counter (zero when absent)
    async fn load_counter(&self, key: &ConversationKey) -> Result<RelationCounter, DomainError>;

    /// Persist the relations counter
    async fn save_counter(
        &self,
        key: &ConversationKey,
        counter: RelationCounter,
    ) -> Result<(), DomainError>;
}
