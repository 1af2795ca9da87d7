//! Chat Routes
//!
//! Session activation, sending, history paging and the typing indicator.
//! Replies are generated in the background; clients poll history.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use omoide::{ConversationKey, MessageCursor, MessagePage, MessageRepository};

use super::error_response;
use crate::models::{
    HistoryQuery, MessagePageResponse, MessageResponse, OpenSessionRequest, SendMessageRequest,
    SessionResponse, TypingResponse, UserQuery,
};
use crate::AppState;

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;

/// Activate a persona for a user (switching away from any other)
#[utoipa::path(
    post,
    path = "/omoide/personas/{id}/session",
    params(
        ("id" = Uuid, Path, description = "Persona ID")
    ),
    request_body = OpenSessionRequest,
    responses(
        (status = 200, description = "Session active", body = SessionResponse),
        (status = 404, description = "Persona not found"),
        (status = 503, description = "Store unavailable")
    ),
    tag = "Chat"
)]
pub async fn open_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<OpenSessionRequest>,
) -> Result<Json<SessionResponse>, (StatusCode, String)> {
    let persona = state
        .persona_service
        .get(&payload.user_id, id)
        .await
        .map_err(error_response)?
        .ok_or((StatusCode::NOT_FOUND, "Persona not found".to_string()))?;

    state
        .chat_service
        .open_session(ConversationKey::new(payload.user_id.clone(), id))
        .await
        .map_err(error_response)?;

    Ok(Json(SessionResponse {
        user_id: payload.user_id,
        persona_id: persona.id,
        persona_name: persona.name,
    }))
}

/// Send a user message; the persona's reply arrives in the background
#[utoipa::path(
    post,
    path = "/omoide/personas/{id}/messages",
    params(
        ("id" = Uuid, Path, description = "Persona ID")
    ),
    request_body = SendMessageRequest,
    responses(
        (status = 202, description = "Message stored, reply pending", body = MessageResponse),
        (status = 400, description = "Empty message"),
        (status = 404, description = "Persona not found"),
        (status = 503, description = "Store unavailable")
    ),
    tag = "Chat"
)]
pub async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), (StatusCode, String)> {
    let key = ConversationKey::new(payload.user_id, id);
    let message = state
        .chat_service
        .send(&key, &payload.text)
        .await
        .map_err(error_response)?;

    let chat = state.chat_service.clone();
    tokio::spawn(async move {
        match chat.respond(&key).await {
            Ok(Some(outcome)) => tracing::debug!(
                conversation = %key,
                chunks = outcome.messages.len(),
                generated = outcome.generated,
                "Reply delivered"
            ),
            Ok(None) => {}
            Err(e) => tracing::warn!(conversation = %key, "Reply failed: {}", e),
        }
    });

    Ok((StatusCode::ACCEPTED, Json(message.into())))
}

/// Latest messages, or the page before `before`
#[utoipa::path(
    get,
    path = "/omoide/personas/{id}/messages",
    params(
        ("id" = Uuid, Path, description = "Persona ID"),
        HistoryQuery
    ),
    responses(
        (status = 200, description = "One page, oldest first", body = MessagePageResponse),
        (status = 503, description = "Store unavailable")
    ),
    tag = "Chat"
)]
pub async fn get_messages(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<MessagePageResponse>, (StatusCode, String)> {
    let key = ConversationKey::new(query.user_id, id);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let page = match query.before {
        Some(before) => state
            .messages
            .more(&key, MessageCursor(before), limit)
            .await
            .map_err(error_response)?,
        None => MessagePage::new(
            state
                .messages
                .recent(&key, limit)
                .await
                .map_err(error_response)?,
        ),
    };

    Ok(Json(page.into()))
}

/// Whether the persona is typing in the user's active session
#[utoipa::path(
    get,
    path = "/omoide/personas/{id}/typing",
    params(
        ("id" = Uuid, Path, description = "Persona ID"),
        UserQuery
    ),
    responses(
        (status = 200, description = "Typing state", body = TypingResponse)
    ),
    tag = "Chat"
)]
pub async fn get_typing(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<UserQuery>,
) -> Json<TypingResponse> {
    let session = state
        .sessions
        .find(&ConversationKey::new(query.user_id, id));

    Json(TypingResponse {
        active: session.is_some(),
        typing: session.is_some_and(|s| s.is_typing()),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/omoide/personas/:id/session", post(open_session))
        .route(
            "/omoide/personas/:id/messages",
            get(get_messages).post(send_message),
        )
        .route("/omoide/personas/:id/typing", get(get_typing))
}
