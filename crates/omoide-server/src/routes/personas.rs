//! Persona Routes
//!
//! HTTP handlers that delegate to PersonaService for business logic.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use super::error_response;
use crate::models::{
    CreatePersonaRequest, KnowledgeResponse, PersonaResponse, UpdatePersonaRequest, UserQuery,
};
use crate::AppState;

/// List the user's personas
#[utoipa::path(
    get,
    path = "/omoide/personas",
    params(UserQuery),
    responses(
        (status = 200, description = "Personas owned by the user", body = Vec<PersonaResponse>),
        (status = 503, description = "Store unavailable")
    ),
    tag = "Persona"
)]
pub async fn list_personas(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<PersonaResponse>>, (StatusCode, String)> {
    let personas = state
        .persona_service
        .list(&query.user_id)
        .await
        .map_err(error_response)?;

    Ok(Json(personas.into_iter().map(Into::into).collect()))
}

/// Create new Persona
#[utoipa::path(
    post,
    path = "/omoide/personas",
    request_body = CreatePersonaRequest,
    responses(
        (status = 200, description = "Persona created successfully", body = PersonaResponse),
        (status = 400, description = "Invalid name or traits"),
        (status = 503, description = "Store unavailable")
    ),
    tag = "Persona"
)]
pub async fn create_persona(
    State(state): State<AppState>,
    Json(payload): Json<CreatePersonaRequest>,
) -> Result<Json<PersonaResponse>, (StatusCode, String)> {
    let persona = state
        .persona_service
        .create(payload.user_id, payload.name, payload.traits)
        .await
        .map_err(error_response)?;

    Ok(Json(persona.into()))
}

/// Get Persona by ID
#[utoipa::path(
    get,
    path = "/omoide/personas/{id}",
    params(
        ("id" = Uuid, Path, description = "Persona ID"),
        UserQuery
    ),
    responses(
        (status = 200, description = "Persona found", body = PersonaResponse),
        (status = 404, description = "Persona not found")
    ),
    tag = "Persona"
)]
pub async fn get_persona(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<UserQuery>,
) -> Result<Json<PersonaResponse>, (StatusCode, String)> {
    let persona = state
        .persona_service
        .get(&query.user_id, id)
        .await
        .map_err(error_response)?
        .ok_or((StatusCode::NOT_FOUND, "Persona not found".to_string()))?;

    Ok(Json(persona.into()))
}

/// Update Persona
#[utoipa::path(
    put,
    path = "/omoide/personas/{id}",
    params(
        ("id" = Uuid, Path, description = "Persona ID")
    ),
    request_body = UpdatePersonaRequest,
    responses(
        (status = 200, description = "Persona updated successfully", body = PersonaResponse),
        (status = 400, description = "Invalid name or traits"),
        (status = 404, description = "Persona not found")
    ),
    tag = "Persona"
)]
pub async fn update_persona(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePersonaRequest>,
) -> Result<Json<PersonaResponse>, (StatusCode, String)> {
    let persona = state
        .persona_service
        .update(&payload.user_id, id, payload.name, payload.traits)
        .await
        .map_err(error_response)?;

    Ok(Json(persona.into()))
}

/// Delete Persona with its conversation knowledge
#[utoipa::path(
    delete,
    path = "/omoide/personas/{id}",
    params(
        ("id" = Uuid, Path, description = "Persona ID"),
        UserQuery
    ),
    responses(
        (status = 200, description = "Persona deleted successfully"),
        (status = 404, description = "Persona not found")
    ),
    tag = "Persona"
)]
pub async fn delete_persona(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<UserQuery>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    // Stop background work for this persona before its rows disappear
    if state
        .sessions
        .current(&query.user_id)
        .is_some_and(|s| s.key().persona_id == id)
    {
        state.sessions.deactivate(&query.user_id);
    }

    let deleted = state
        .persona_service
        .delete(&query.user_id, id)
        .await
        .map_err(error_response)?;

    if !deleted {
        return Err((StatusCode::NOT_FOUND, "Persona not found".to_string()));
    }

    Ok(Json(serde_json::json!({
        "status": "ok",
        "message": "Persona deleted"
    })))
}

/// Get merged knowledge for the user's conversation with this persona
#[utoipa::path(
    get,
    path = "/omoide/personas/{id}/knowledge",
    params(
        ("id" = Uuid, Path, description = "Persona ID"),
        UserQuery
    ),
    responses(
        (status = 200, description = "Merged knowledge", body = KnowledgeResponse),
        (status = 404, description = "Persona not found")
    ),
    tag = "Persona"
)]
pub async fn get_knowledge(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<UserQuery>,
) -> Result<Json<KnowledgeResponse>, (StatusCode, String)> {
    let knowledge = state
        .persona_service
        .knowledge(&query.user_id, id)
        .await
        .map_err(error_response)?;

    Ok(Json(KnowledgeResponse {
        persona_id: id,
        user_id: query.user_id,
        knowledge,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/omoide/personas", get(list_personas).post(create_persona))
        .route(
            "/omoide/personas/:id",
            get(get_persona).put(update_persona).delete(delete_persona),
        )
        .route("/omoide/personas/:id/knowledge", get(get_knowledge))
}
