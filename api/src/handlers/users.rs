//! User handlers
//!
//! Endpoints for customer registration and the current user.

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::app::Registration;
use crate::domain::entities::User;
use crate::error::AppError;
use crate::AppState;

/// Request body for customer registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Response body for customer registration
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: User,
    /// API key for DetailHub API calls (Authorization: Bearer <api_key>)
    pub api_key: String,
    pub message: String,
}

/// POST /api/users/register
///
/// Register a customer. The API key is only shown once.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let registration = Registration {
        email: request.email,
        full_name: request.full_name,
        phone: request.phone,
    };
    let (user, api_key) = state.user_service.register(&registration).await?;

    let message = format!(
        "Welcome to DetailHub! Save this API key - it won't be shown again.\n\n\
         API Usage:\n\
           curl -H \"Authorization: Bearer {}\" {}/api/me",
        api_key, state.config.api_base_url,
    );

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user,
            api_key,
            message,
        }),
    ))
}

/// GET /api/me
pub async fn me(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}
