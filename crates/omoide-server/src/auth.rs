//! Simple API Key Authentication (Bearer Token)

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};

/// API Key from secrets
static API_KEY: std::sync::OnceLock<String> = std::sync::OnceLock::new();

/// Initialize the API key
pub fn init_api_key(key: String) {
    let _ = API_KEY.set(key);
}

fn get_api_key() -> Option<&'static str> {
    API_KEY.get().map(|s| s.as_str())
}

/// Outcome of checking an Authorization header against the configured key
#[derive(Debug, PartialEq, Eq)]
enum Verdict {
    Disabled,
    Accepted,
    Rejected(&'static str),
}

fn check(expected: Option<&str>, header: Option<&str>) -> Verdict {
    let expected = match expected {
        Some(key) if !key.is_empty() => key,
        _ => return Verdict::Disabled,
    };

    match header.map(|h| h.strip_prefix("Bearer ")) {
        Some(Some(token)) if token == expected => Verdict::Accepted,
        Some(Some(_)) => Verdict::Rejected("Invalid API key attempted"),
        Some(None) => Verdict::Rejected("Invalid Authorization header format"),
        None => Verdict::Rejected("Missing Authorization header"),
    }
}

/// Authentication middleware
/// Validates Bearer token against the API key
pub async fn auth_middleware(request: Request, next: Next) -> Result<Response, StatusCode> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    match check(get_api_key(), auth_header) {
        Verdict::Disabled => {
            // No API key configured = auth disabled (for development)
            tracing::warn!("No API key configured, authentication disabled");
            Ok(next.run(request).await)
        }
        Verdict::Accepted => Ok(next.run(request).await),
        Verdict::Rejected(reason) => {
            tracing::warn!("{}", reason);
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
