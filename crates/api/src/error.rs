//! Mapping from service errors to HTTP responses.

use auth::{AuthError, StoreError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing or invalid Authorization header")]
    MissingBearer,

    #[error(transparent)]
    Auth(#[from] AuthError),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingBearer => StatusCode::UNAUTHORIZED,
            ApiError::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
                AuthError::Forbidden => StatusCode::FORBIDDEN,
                AuthError::NotFound(_) => StatusCode::NOT_FOUND,
                AuthError::NoChange(_) => StatusCode::CONFLICT,
                AuthError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                AuthError::Store(StoreError::DuplicateEmail(_)) => StatusCode::CONFLICT,
                AuthError::Store(_)
                | AuthError::HashingError(_)
                | AuthError::TokenGenerationError(_)
                | AuthError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::MissingBearer => "AUTH_001",
            ApiError::Auth(err) => match err {
                AuthError::InvalidToken => "AUTH_002",
                AuthError::InvalidCredentials => "AUTH_003",
                AuthError::Forbidden => "AUTHZ_001",
                AuthError::NotFound(_) => "USER_001",
                AuthError::NoChange(_) => "USER_002",
                AuthError::Store(StoreError::DuplicateEmail(_)) => "USER_003",
                AuthError::InvalidInput(_) => "VAL_001",
                AuthError::Store(_) => "STORE_001",
                _ => "INT_001",
            },
        }
    }

    /// Message safe to hand to the caller. Server-side failures never
    /// carry their detail.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Auth(AuthError::Store(StoreError::DuplicateEmail(_))) => {
                "Email already registered".to_string()
            }
            ApiError::Auth(AuthError::NoChange(_)) => {
                "Update matched the user but changed nothing".to_string()
            }
            err if err.status_code().is_server_error() => {
                "An internal server error occurred".to_string()
            }
            err => err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.public_message(),
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::MissingBearer, StatusCode::UNAUTHORIZED),
            (AuthError::InvalidToken.into(), StatusCode::UNAUTHORIZED),
            (AuthError::InvalidCredentials.into(), StatusCode::UNAUTHORIZED),
            (AuthError::Forbidden.into(), StatusCode::FORBIDDEN),
            (AuthError::NotFound("x".into()).into(), StatusCode::NOT_FOUND),
            (AuthError::NoChange("x".into()).into(), StatusCode::CONFLICT),
            (
                AuthError::Store(StoreError::DuplicateEmail("a@b.com".into())).into(),
                StatusCode::CONFLICT,
            ),
            (
                AuthError::Store(StoreError::Backend("db down".into())).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{}", err);
        }
    }

    #[test]
    fn test_store_detail_is_not_exposed() {
        let err: ApiError = AuthError::Store(StoreError::Backend("password=hunter2".into())).into();
        assert!(!err.public_message().contains("hunter2"));

        let dup: ApiError = AuthError::Store(StoreError::DuplicateEmail("a@b.com".into())).into();
        assert!(!dup.public_message().contains("a@b.com"));
    }
}
