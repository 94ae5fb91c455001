use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};
use crate::model::Role;

/// The only signing algorithm issued or accepted.
pub const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// User role; absent in the payload means non-privileged
    #[serde(default)]
    pub role: Role,
    /// Issued at (timestamp)
    pub iat: i64,
    /// Expiration time (timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create new claims issued at `now` that expire `expires_in_seconds` later
    pub fn new(subject: String, role: Role, now: DateTime<Utc>, expires_in_seconds: i64) -> Self {
        let expiration = now + Duration::seconds(expires_in_seconds);

        Self {
            sub: subject,
            role,
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        }
    }

    /// Expiry is exclusive: at the `exp` second the token is already dead.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Issues and validates session tokens under one process-wide secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expires_in_seconds: i64,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("algorithm", &TOKEN_ALGORITHM)
            .field("expires_in_seconds", &self.expires_in_seconds)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Build an issuer for `secret`, handing out tokens valid for
    /// `expires_in_seconds`.
    ///
    /// An empty secret or a non-positive lifetime is a configuration error.
    pub fn new(secret: &str, expires_in_seconds: i64) -> Result<Self> {
        if secret.is_empty() {
            return Err(AuthError::Configuration("token secret is empty".to_string()));
        }
        if expires_in_seconds <= 0 {
            return Err(AuthError::Configuration(format!(
                "token lifetime must be positive, got {}",
                expires_in_seconds
            )));
        }

        let mut validation = Validation::new(TOKEN_ALGORITHM);
        // Expiry is checked against an injectable clock in `validate_at`.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expires_in_seconds,
        })
    }

    pub fn expires_in_seconds(&self) -> i64 {
        self.expires_in_seconds
    }

    pub fn issue(&self, user_id: &str, role: Role) -> Result<String> {
        self.issue_at(user_id, role, Utc::now())
    }

    pub fn issue_at(&self, user_id: &str, role: Role, now: DateTime<Utc>) -> Result<String> {
        let claims = Claims::new(user_id.to_string(), role, now, self.expires_in_seconds);

        encode(&Header::new(TOKEN_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGenerationError(e.to_string()))
    }

    pub fn validate(&self, token: &str) -> Result<Claims> {
        self.validate_at(token, Utc::now())
    }

    /// Validate `token` as of `now`.
    ///
    /// Every failure collapses into [`AuthError::InvalidToken`]; the actual
    /// reason is only logged.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                let reason = match e.kind() {
                    ErrorKind::InvalidSignature => "bad signature",
                    ErrorKind::InvalidAlgorithm => "unexpected algorithm",
                    ErrorKind::MissingRequiredClaim(_) => "missing claim",
                    _ => "malformed",
                };
                tracing::debug!(reason, error = %e, "token rejected");
                AuthError::InvalidToken
            })?;

        let claims = token_data.claims;

        if claims.is_expired_at(now) {
            tracing::debug!(reason = "expired", sub = %claims.sub, exp = claims.exp, "token rejected");
            return Err(AuthError::InvalidToken);
        }

        Ok(claims)
    }
}

/// Generate a JWT token for a user
///
/// # Arguments
/// * `user_id` - The user identifier
/// * `role` - The user's role
/// * `secret` - The secret key for signing the token
/// * `expires_in_seconds` - Token expiration time in seconds (e.g., 3600 for 1 hour)
pub fn generate_token(user_id: &str, role: Role, secret: &str, expires_in_seconds: i64) -> Result<String> {
    TokenIssuer::new(secret, expires_in_seconds)?.issue(user_id, role)
}

/// Validate a JWT token and return the claims
///
/// Any failure, including an empty `secret`, is [`AuthError::InvalidToken`].
///
/// # Arguments
/// * `token` - The JWT token to validate
/// * `secret` - The secret key used to sign the token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims> {
    // The lifetime only matters when issuing.
    let issuer = TokenIssuer::new(secret, 1).map_err(|e| {
        tracing::debug!(reason = "unusable secret", error = %e, "token rejected");
        AuthError::InvalidToken
    })?;
    issuer.validate(token)
}
