//! Global settings DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use omoide::GlobalSettings;

/// Cached global settings
#[derive(Debug, Serialize, ToSchema)]
pub struct ConfigResponse {
    #[schema(value_type = Object)]
    pub settings: GlobalSettings,
    /// Seconds the cache keeps a fetched copy
    pub ttl_secs: u64,
    /// Approximate wall-clock time of the last fetch
    pub last_fetched_at: Option<DateTime<Utc>>,
}
