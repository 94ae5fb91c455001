use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Covers bad signatures, unexpected algorithms and expiry alike.
    #[error("Invalid token")]
    InvalidToken,

    #[error("Forbidden: privileged role required")]
    Forbidden,

    #[error("User not found: {0}")]
    NotFound(String),

    #[error("No change applied to user {0}")]
    NoChange(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Password hashing failed: {0}")]
    HashingError(String),

    #[error("Token generation failed: {0}")]
    TokenGenerationError(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;
