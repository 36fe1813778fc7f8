//! API key authentication middleware

use axum::{
    body::Body, extract::State, http::Request, middleware::Next, response::Response, Extension,
};

use crate::app::hash_api_key;
use crate::domain::entities::User;
use crate::error::AppError;
use crate::AppState;

/// Extract the API key from the Authorization header
fn extract_api_key(request: &Request<Body>) -> Option<&str> {
    request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|k| !k.is_empty())
}

/// Authentication middleware
///
/// Validates the API key and injects the User into request extensions.
/// Routes that require authentication should use this middleware.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let api_key = extract_api_key(&request).ok_or(AppError::Unauthorized)?;
    let key_hash = hash_api_key(api_key);

    let user = state
        .user_service
        .find_by_api_key(&key_hash)
        .await?
        .ok_or(AppError::Unauthorized)?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Admin gate. Must run after `auth_middleware`.
pub async fn require_admin(
    Extension(user): Extension<User>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if !user.is_admin() {
        tracing::debug!(user_id = %user.id, "Admin route refused");
        return Err(AppError::Forbidden);
    }
    Ok(next.run(request).await)
}
