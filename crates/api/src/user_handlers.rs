use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth_handlers::RegisterRequest;
use crate::error::ApiError;
use crate::middleware::{AdminClaims, AuthClaims};
use crate::AppState;
use auth::{Role, User, UserUpdate};

/// Public view of a user; the password digest never leaves the service.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub password: Option<String>,
}

impl From<UpdateUserRequest> for UserUpdate {
    fn from(request: UpdateUserRequest) -> Self {
        UserUpdate {
            name: request.name,
            email: request.email,
            role: request.role,
            password: request.password,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

/// GET /users - List every user
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    AuthClaims(_claims): AuthClaims,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.sessions.list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// GET /users/{id} - Fetch one user
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    AuthClaims(_claims): AuthClaims,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.sessions.get_user(&id).await?;
    Ok(Json(user.into()))
}

/// POST /users - Create a user with any role (admin only)
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    AdminClaims(claims): AdminClaims,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = state.sessions.register(payload.into()).await?;
    tracing::info!(by = %claims.sub, user_id = %user.id, "user created by admin");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// PUT /users/{id} - Update a user (admin only)
///
/// A missing or empty password keeps the stored one.
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    AdminClaims(claims): AdminClaims,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.sessions.update_user(&id, payload.into()).await?;
    tracing::info!(by = %claims.sub, user_id = %user.id, "user updated by admin");
    Ok(Json(user.into()))
}

/// DELETE /users/{id} - Delete a user (admin only)
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    AdminClaims(claims): AdminClaims,
) -> Result<Json<DeleteResponse>, ApiError> {
    state.sessions.delete_user(&id).await?;
    tracing::info!(by = %claims.sub, user_id = %id, "user deleted by admin");
    Ok(Json(DeleteResponse { deleted: true }))
}
