use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::{
    error::{AuthError, Result},
    jwt::{Claims, TokenIssuer},
    model::{NewUser, Role, User, UserChanges},
    password::{hash_password, verify_password, HashCost, MAX_PASSWORD_LENGTH},
    store::{DeleteOutcome, UpdateOutcome, UserStore},
};

/// Registration input; the password is hashed before it reaches the store.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub password: String,
}

/// Requested changes to a user. `None` fields keep their stored value, and
/// an empty password counts as no password.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub password: Option<String>,
}

/// Login, registration and user lifecycle on top of a [`UserStore`].
pub struct SessionService {
    store: Arc<dyn UserStore>,
    tokens: TokenIssuer,
    cost: HashCost,
    // Verified against when the email is unknown so both failure paths
    // cost one argon2 run.
    dummy_hash: String,
}

impl SessionService {
    /// Create a new SessionService
    ///
    /// # Arguments
    /// * `store` - User store adapter
    /// * `tokens` - Issuer holding the signing secret and token lifetime
    /// * `cost` - Argon2 cost for new digests
    pub fn new(store: Arc<dyn UserStore>, tokens: TokenIssuer, cost: HashCost) -> Result<Self> {
        let dummy_hash = hash_password("userdir-timing-equaliser", &cost)?;

        Ok(Self {
            store,
            tokens,
            cost,
            dummy_hash,
        })
    }

    /// Check credentials and return a session token for the user
    ///
    /// Unknown email, wrong password and an unusable stored digest all
    /// come back as [`AuthError::InvalidCredentials`].
    pub async fn login(&self, email: &str, password: &str) -> Result<(String, User)> {
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let user = match self.store.find_by_email(email).await? {
            Some(user) => user,
            None => {
                self.verify(password, &self.dummy_hash).await?;
                debug!("login rejected: unknown email");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !self.verify(password, &user.password_hash).await? {
            warn!(user_id = %user.id, "login rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(&user.id, user.role.clone()).map_err(|e| {
            error!(user_id = %user.id, error = %e, "token issuance failed");
            e
        })?;

        info!(user_id = %user.id, role = %user.role, "login succeeded");
        Ok((token, user))
    }

    /// Validate a session token and return its claims
    pub fn validate(&self, token: &str) -> Result<Claims> {
        self.tokens.validate(token)
    }

    /// Register a new user
    ///
    /// Email uniqueness is enforced by the store; a duplicate surfaces as
    /// [`StoreError::DuplicateEmail`](crate::store::StoreError::DuplicateEmail).
    pub async fn register(&self, account: NewAccount) -> Result<User> {
        if account.email.trim().is_empty() {
            return Err(AuthError::InvalidInput("email is required".to_string()));
        }
        if account.password.is_empty() {
            return Err(AuthError::InvalidInput("password is required".to_string()));
        }
        check_password_length(&account.password)?;

        let password_hash = self.hash(account.password).await?;

        let user = self
            .store
            .insert(NewUser {
                name: account.name,
                email: account.email,
                password_hash,
                role: account.role,
            })
            .await?;

        info!(user_id = %user.id, role = %user.role, "user registered");
        Ok(user)
    }

    /// Apply `update` to the user with `id` through the store's atomic
    /// conditional update. No retry is attempted on any outcome.
    pub async fn update_user(&self, id: &str, update: UserUpdate) -> Result<User> {
        let password_hash = match update.password.filter(|p| !p.is_empty()) {
            Some(password) => {
                check_password_length(&password)?;
                Some(self.hash(password).await?)
            }
            None => None,
        };

        let changes = UserChanges {
            name: update.name,
            email: update.email,
            role: update.role,
            password_hash,
        };

        match self.store.conditional_update(id, changes).await? {
            UpdateOutcome::Updated(user) => {
                info!(user_id = %user.id, "user updated");
                Ok(user)
            }
            UpdateOutcome::NoChange => {
                debug!(user_id = id, "update matched but changed nothing");
                Err(AuthError::NoChange(id.to_string()))
            }
            UpdateOutcome::NotFound => Err(AuthError::NotFound(id.to_string())),
        }
    }

    pub async fn delete_user(&self, id: &str) -> Result<()> {
        match self.store.delete(id).await? {
            DeleteOutcome::Deleted => {
                info!(user_id = id, "user deleted");
                Ok(())
            }
            DeleteOutcome::NotFound => Err(AuthError::NotFound(id.to_string())),
        }
    }

    pub async fn get_user(&self, id: &str) -> Result<User> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AuthError::NotFound(id.to_string()))
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.store.list_all().await?)
    }

    /// Register `account` as an admin unless its email is already taken.
    ///
    /// Returns the created user, or `None` when nothing was done.
    pub async fn ensure_admin(&self, account: NewAccount) -> Result<Option<User>> {
        if self.store.find_by_email(&account.email).await?.is_some() {
            return Ok(None);
        }

        let user = self
            .register(NewAccount {
                role: Role::Admin,
                ..account
            })
            .await?;
        Ok(Some(user))
    }

    async fn hash(&self, password: String) -> Result<String> {
        let cost = self.cost;
        tokio::task::spawn_blocking(move || hash_password(&password, &cost))
            .await
            .map_err(|e| AuthError::HashingError(e.to_string()))?
    }

    async fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AuthError::HashingError(e.to_string()))
    }
}

fn check_password_length(password: &str) -> Result<()> {
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AuthError::InvalidInput(format!(
            "password exceeds {} bytes",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}
