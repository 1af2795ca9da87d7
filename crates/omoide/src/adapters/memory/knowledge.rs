//! In-memory KnowledgeRepository

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::domain::{errors::DomainError, ConversationKey, KnowledgeState, RelationCounter};
use crate::ports::KnowledgeRepository;

/// Knowledge and relation counters kept in memory.
///
/// `set_available(false)` makes every call fail with `StoreUnavailable`.
pub struct InMemoryKnowledgeRepository {
    states: RwLock<HashMap<ConversationKey, KnowledgeState>>,
    counters: RwLock<HashMap<ConversationKey, RelationCounter>>,
    available: AtomicBool,
}

impl InMemoryKnowledgeRepository {
    pub fn new() -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            counters: RwLock::new(HashMap::new()),
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
                "knowledge store is offline".to_string(),
            ))
        }
    }
}

impl Default for InMemoryKnowledgeRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KnowledgeRepository for InMemoryKnowledgeRepository {
    async fn find(&self, key: &ConversationKey) -> Result<Option<KnowledgeState>, DomainError> {
        self.check()?;
        Ok(self.states.read().await.get(key).cloned())
    }

    async fn save(&self, key: &ConversationKey, state: &KnowledgeState) -> Result<(), DomainError> {
        self.check()?;
        self.states.write().await.insert(key.clone(), state.clone());
        Ok(())
    }

    async fn delete(&self, key: &ConversationKey) -> Result<bool, DomainError> {
        self.check()?;
        self.counters.write().await.remove(key);
        Ok(self.states.write().await.remove(key).is_some())
    }

    async fn load_counter(&self, key: &ConversationKey) -> Result<RelationCounter, DomainError> {
        self.check()?;
        Ok(self
            .counters
            .read()
            .await
            .get(key)
            .copied()
            .unwrap_or_default())
    }

    async fn save_counter(
        &self,
        key: &ConversationKey,
        counter: RelationCounter,
    ) -> Result<(), DomainError> {
        self.check()?;
        self.counters.write().await.insert(key.clone(), counter);
        Ok(())
    }
}
