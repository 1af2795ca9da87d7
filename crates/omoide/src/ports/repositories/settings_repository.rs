//! Settings Repository Port

use async_trait::async_trait;

use crate::domain::{errors::DomainError, GlobalSettings};

/// Source of the operator-wide configuration
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Fetch the current settings (defaults when none are stored)
    async fn fetch(&self) -> Result<GlobalSettings, DomainError>;
}
