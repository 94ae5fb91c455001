use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiError;
use crate::middleware::extract_claims;
use crate::user_handlers::UserResponse;
use crate::AppState;
use auth::{is_privileged, AuthError, NewAccount, Role};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    pub password: String,
}

impl From<RegisterRequest> for NewAccount {
    fn from(request: RegisterRequest) -> Self {
        NewAccount {
            name: request.name,
            email: request.email,
            role: request.role,
            password: request.password,
        }
    }
}

/// POST /auth/login - Exchange credentials for a session token
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (token, _user) = state
        .sessions
        .login(&payload.email, &payload.password)
        .await?;

    Ok(Json(LoginResponse { token }))
}

/// POST /auth/register - Self-service registration
///
/// Requesting the privileged role requires an admin bearer token.
pub async fn register(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    if payload.role == Role::Admin {
        let caller_is_admin = extract_claims(&state, &headers)
            .map(|claims| is_privileged(&claims))
            .unwrap_or(false);
        if !caller_is_admin {
            tracing::warn!(email = %payload.email, "admin self-registration refused");
            return Err(AuthError::Forbidden.into());
        }
    }

    let user = state.sessions.register(payload.into()).await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}
