use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::AppState;
use auth::{require_privileged, Claims};

/// Token carried in an `Authorization: Bearer <token>` header, if any
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Extract and validate the bearer token from the request headers
pub fn extract_claims(state: &AppState, headers: &HeaderMap) -> Result<Claims, ApiError> {
    let token = bearer_token(headers).ok_or(ApiError::MissingBearer)?;

    state.sessions.validate(token).map_err(ApiError::from)
}

/// Middleware to require authentication
///
/// Rejects before the handler runs; on success the claims are stored in the
/// request extensions for [`AuthClaims`] / [`AdminClaims`] to pick up.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = extract_claims(&state, request.headers()).inspect_err(|e| {
        tracing::warn!(path = %request.uri().path(), error = %e, "unauthenticated request");
    })?;

    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

/// Extractor for validated claims
/// Use this in handlers that are protected by `require_auth`
#[derive(Debug, Clone)]
pub struct AuthClaims(pub Claims);

impl<S> FromRequestParts<S> for AuthClaims
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthClaims)
            .ok_or(ApiError::MissingBearer)
    }
}

/// Extractor for claims holding the privileged role
#[derive(Debug, Clone)]
pub struct AdminClaims(pub Claims);

impl<S> FromRequestParts<S> for AdminClaims
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let AuthClaims(claims) = AuthClaims::from_request_parts(parts, state).await?;

        require_privileged(&claims).inspect_err(|_| {
            tracing::warn!(sub = %claims.sub, role = %claims.role, "privileged operation denied");
        })?;

        Ok(AdminClaims(claims))
    }
}
