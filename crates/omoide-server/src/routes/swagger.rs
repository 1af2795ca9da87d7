//! OpenAPI Documentation
//!
//! Centralized API documentation using utoipa.

use utoipa::OpenApi;

use crate::models::{
    // Config models
    ConfigResponse,
    // Persona models
    CreatePersonaRequest,
    KnowledgeResponse,
    // Chat models
    MessagePageResponse,
    MessageResponse,
    OpenSessionRequest,
    PersonaResponse,
    SendMessageRequest,
    SenderDto,
    SessionResponse,
    TypingResponse,
    UpdatePersonaRequest,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Persona endpoints
        super::personas::list_personas,
        super::personas::create_persona,
        super::personas::get_persona,
        super::personas::update_persona,
        super::personas::delete_persona,
        super::personas::get_knowledge,
        // Chat endpoints
        super::chat::open_session,
        super::chat::send_message,
        super::chat::get_messages,
        super::chat::get_typing,
        // Config endpoints
        super::config::get_config,
        super::config::invalidate_config,
    ),
    info(
        title = "Omoide API",
        version = "0.1.0",
        description = "思い出 (Omoide) - Persona chat with memory that grows from the conversation",
        license(name = "MIT"),
    ),
    servers(
        (url = "/", description = "Current server"),
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Persona", description = "Persona management and merged knowledge"),
        (name = "Chat", description = "Sessions, messages and typing state"),
        (name = "Config", description = "Cached global settings"),
    ),
    components(
        schemas(
            // Persona
            CreatePersonaRequest,
            UpdatePersonaRequest,
            PersonaResponse,
            KnowledgeResponse,
            // Chat
            SenderDto,
            MessageResponse,
            MessagePageResponse,
            OpenSessionRequest,
            SessionResponse,
            SendMessageRequest,
            TypingResponse,
            // Config
            ConfigResponse,
        )
    ),
)]
pub struct ApiDoc;
