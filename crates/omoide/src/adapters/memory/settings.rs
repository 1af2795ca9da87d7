//! In-memory SettingsRepository

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::domain::{errors::DomainError, GlobalSettings};
use crate::ports::SettingsRepository;

/// Settings held in memory, with a fetch counter for cache assertions
#[derive(Default)]
pub struct InMemorySettingsRepository {
    settings: RwLock<GlobalSettings>,
    fetches: AtomicUsize,
}

impl InMemorySettingsRepository {
    pub fn new(settings: GlobalSettings) -> Self {
        Self {
            settings: RwLock::new(settings),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Replace the stored settings (readers see it after their cache expires)
    pub async fn update(&self, settings: GlobalSettings) {
        *self.settings.write().await = settings;
    }

    /// Number of `fetch` calls served so far
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SettingsRepository for InMemorySettingsRepository {
    async fn fetch(&self) -> Result<GlobalSettings, DomainError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.settings.read().await.clone())
    }
}
