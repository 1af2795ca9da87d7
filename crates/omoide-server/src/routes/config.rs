//! Global Settings Routes

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use super::error_response;
use crate::models::ConfigResponse;
use crate::AppState;

/// Current global settings (served from the cache)
#[utoipa::path(
    get,
    path = "/omoide/config",
    responses(
        (status = 200, description = "Global settings", body = ConfigResponse),
        (status = 503, description = "Store unavailable")
    ),
    tag = "Config"
)]
pub async fn get_config(
    State(state): State<AppState>,
) -> Result<Json<ConfigResponse>, (StatusCode, String)> {
    let settings = state.config.get().await.map_err(error_response)?;
    let last_fetched_at = state.config.last_fetched_at().await.and_then(|at| {
        chrono::Duration::from_std(at.elapsed())
            .ok()
            .map(|age| chrono::Utc::now() - age)
    });

    Ok(Json(ConfigResponse {
        settings: (*settings).clone(),
        ttl_secs: state.config.ttl().as_secs(),
        last_fetched_at,
    }))
}

/// Drop the cached settings so the next read refetches
#[utoipa::path(
    post,
    path = "/omoide/config/invalidate",
    responses(
        (status = 200, description = "Cache invalidated")
    ),
    tag = "Config"
)]
pub async fn invalidate_config(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.config.invalidate().await;

    Json(serde_json::json!({
        "status": "ok",
        "message": "Settings cache invalidated"
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/omoide/config", get(get_config))
        .route("/omoide/config/invalidate", post(invalidate_config))
}
