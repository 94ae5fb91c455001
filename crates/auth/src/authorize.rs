use crate::error::{AuthError, Result};
use crate::jwt::Claims;
use crate::model::Role;

/// Whether the validated caller holds the privileged role.
pub fn is_privileged(claims: &Claims) -> bool {
    match claims.role {
        Role::Admin => true,
        Role::User | Role::Other(_) => false,
    }
}

pub fn require_privileged(claims: &Claims) -> Result<()> {
    if is_privileged(claims) {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}
