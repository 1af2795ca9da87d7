//! Omoide API Routes
//!
//! - /omoide/personas - Persona management and knowledge inspection
//! - /omoide/personas/:id/session - Activate a persona for a user
//! - /omoide/personas/:id/messages - Send, and page through history
//! - /omoide/personas/:id/typing - Typing indicator
//! - /omoide/config - Cached global settings

use axum::http::StatusCode;

use omoide::DomainError;

pub mod chat;
pub mod config;
pub mod personas;
pub mod swagger;

/// Map a domain error onto an HTTP status with its message
pub fn error_response(e: DomainError) -> (StatusCode, String) {
    let status = match &e {
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        DomainError::GenerationFailure(_) => StatusCode::BAD_GATEWAY,
        DomainError::ExtractionParseFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            error_response(DomainError::not_found("Persona", Uuid::nil())).0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            error_response(DomainError::StoreUnavailable("down".into())).0,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            error_response(DomainError::Validation("empty".into())).0,
            StatusCode::BAD_REQUEST
        );
    }
}
