//! Config Service - cached GlobalSettings
//!
//! An explicit value passed to every reader instead of an ambient global.
//! Settings are refetched once `ttl` has elapsed since `last_fetched_at`,
//! or after [`ConfigService::invalidate`].

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::domain::{DomainError, GlobalSettings};
use crate::ports::SettingsRepository;

/// Fixed cache lifetime for global settings
pub const DEFAULT_SETTINGS_TTL: Duration = Duration::from_secs(5 * 60);

struct CachedSettings {
    settings: Arc<GlobalSettings>,
    last_fetched_at: Instant,
}

/// Cached view over a [`SettingsRepository`]
pub struct ConfigService {
    repo: Arc<dyn SettingsRepository>,
    ttl: Duration,
    cache: RwLock<Option<CachedSettings>>,
}

impl ConfigService {
    pub fn new(repo: Arc<dyn SettingsRepository>) -> Self {
        Self::with_ttl(repo, DEFAULT_SETTINGS_TTL)
    }

    pub fn with_ttl(repo: Arc<dyn SettingsRepository>, ttl: Duration) -> Self {
        Self {
            repo,
            ttl,
            cache: RwLock::new(None),
        }
    }

    /// Current settings, fetched from the repository when the cache is cold
    /// or expired
    pub async fn get(&self) -> Result<Arc<GlobalSettings>, DomainError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.last_fetched_at.elapsed() < self.ttl {
                    return Ok(cached.settings.clone());
                }
            }
        }

        let mut cache = self.cache.write().await;
        // Another task may have refreshed while we waited for the lock
        if let Some(cached) = cache.as_ref() {
            if cached.last_fetched_at.elapsed() < self.ttl {
                return Ok(cached.settings.clone());
            }
        }

        let settings = Arc::new(self.repo.fetch().await?);
        *cache = Some(CachedSettings {
            settings: settings.clone(),
            last_fetched_at: Instant::now(),
        });
        tracing::debug!("⚙️  Global settings refreshed");

        Ok(settings)
    }

    /// Drop the cached value so the next `get` refetches
    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
        tracing::info!("⚙️  Global settings cache invalidated");
    }

    /// When the cached value was fetched, `None` if the cache is empty
    pub async fn last_fetched_at(&self) -> Option<Instant> {
        self.cache.read().await.as_ref().map(|c| c.last_fetched_at)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
