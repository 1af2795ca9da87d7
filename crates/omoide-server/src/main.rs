use axum::{extract::FromRef, middleware, routing::get, Json, Router};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod adapters;
mod application;
mod auth;
mod models;
mod routes;

use adapters::{
    OpenAiCompatProvider, PgKnowledgeRepository, PgMessageStore, PgPersonaRepository,
    PgSettingsRepository,
};
use application::PersonaService;
use omoide::application::{ChatService, ConfigService, SessionRegistry, DEFAULT_SETTINGS_TTL};

/// Type alias for the persona service with concrete repository implementations
pub type AppPersonaService = PersonaService<PgPersonaRepository, PgKnowledgeRepository>;

/// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub persona_service: Arc<AppPersonaService>,
    pub chat_service: Arc<ChatService>,
    pub messages: Arc<PgMessageStore>,
    pub sessions: Arc<SessionRegistry>,
    pub config: Arc<ConfigService>,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> PgPool {
        state.pool.clone()
    }
}

#[derive(Serialize)]
struct HealthCheck {
    status: String,
    message: String,
    version: String,
}

async fn health_check() -> Json<HealthCheck> {
    Json(HealthCheck {
        status: "ok".to_string(),
        message: "Omoide API is running - every conversation leaves a memory".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[shuttle_runtime::main]
async fn main(
    #[shuttle_shared_db::Postgres] pool: PgPool,
    #[shuttle_runtime::Secrets] secrets: shuttle_runtime::SecretStore,
) -> shuttle_axum::ShuttleAxum {
    tracing::info!("🌸 Omoide API initializing...");

    // Initialize API key from secrets
    if let Some(api_key) = secrets.get("OMOIDE_API_KEY") {
        auth::init_api_key(api_key);
        tracing::info!("🔐 API key authentication enabled");
    } else {
        tracing::warn!("⚠️  No OMOIDE_API_KEY set - authentication disabled");
    }

    // Run migrations
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("✅ Database migrations completed");

    // Text generation
    let llm_api_key = secrets.get("LLM_API_KEY").unwrap_or_else(|| {
        tracing::warn!("⚠️  No LLM_API_KEY set - replies will fall back to the apology message");
        String::new()
    });
    let llm = Arc::new(OpenAiCompatProvider::new(
        llm_api_key,
        secrets.get("LLM_BASE_URL"),
    ));
    tracing::info!("🤖 Completion provider initialized");

    // Global settings cache
    let ttl = secrets
        .get("SETTINGS_TTL_SECS")
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_SETTINGS_TTL);
    let config = Arc::new(ConfigService::with_ttl(
        Arc::new(PgSettingsRepository::new(pool.clone())),
        ttl,
    ));
    tracing::info!("⚙️  Settings cache TTL: {}s", ttl.as_secs());

    // Initialize application services
    let persona_repo = Arc::new(PgPersonaRepository::new(pool.clone()));
    let knowledge_repo = Arc::new(PgKnowledgeRepository::new(pool.clone()));
    let messages = Arc::new(PgMessageStore::new(pool.clone()));
    let sessions = Arc::new(SessionRegistry::new());

    let persona_service = Arc::new(PersonaService::new(
        persona_repo.clone(),
        knowledge_repo.clone(),
        config.clone(),
    ));
    let chat_service = Arc::new(ChatService::new(
        messages.clone(),
        persona_repo,
        knowledge_repo,
        llm,
        config.clone(),
        sessions.clone(),
    ));

    // Create application state
    let state = AppState {
        pool,
        persona_service,
        chat_service,
        messages,
        sessions,
        config,
    };

    // Protected routes (require authentication)
    let protected_routes = Router::new()
        .merge(routes::personas::router())
        .merge(routes::chat::router())
        .merge(routes::config::router())
        .layer(middleware::from_fn(auth::auth_middleware));

    // OpenAPI documentation
    let openapi = routes::swagger::ApiDoc::openapi();

    // Build router with shared state
    let router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .route("/health", get(health_check))
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .with_state(state);

    tracing::info!("📚 Swagger UI: /swagger-ui");
    tracing::info!("✅ Omoide API ready - personas remember");

    Ok(router.into())
}
