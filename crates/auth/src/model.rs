use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role granted to a user.
///
/// Roles travel as plain strings in tokens and stored records. Only the
/// exact string `"Admin"` is privileged. `"User"`, an empty string and a
/// missing value read back as [`Role::User`]; any other string is kept
/// verbatim as [`Role::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    #[default]
    User,
    Other(String),
}

impl Role {
    pub const ADMIN: &'static str = "Admin";
    pub const USER: &'static str = "User";

    pub fn parse(value: &str) -> Self {
        match value {
            Self::ADMIN => Role::Admin,
            "" | Self::USER => Role::User,
            other => Role::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => Self::ADMIN,
            Role::User => Self::USER,
            Role::Other(name) => name,
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            Self::ADMIN => Role::Admin,
            "" | Self::USER => Role::User,
            _ => Role::Other(value),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored user record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    #[serde(default)]
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether applying `changes` would leave every mutable field as it is.
    pub fn is_unchanged_by(&self, changes: &UserChanges) -> bool {
        changes.name.as_ref().is_none_or(|name| *name == self.name)
            && changes.email.as_ref().is_none_or(|email| *email == self.email)
            && changes.role.as_ref().is_none_or(|role| *role == self.role)
            && changes
                .password_hash
                .as_ref()
                .is_none_or(|hash| *hash == self.password_hash)
    }

    /// Apply `changes` and stamp `updated_at`.
    pub fn apply(&mut self, changes: UserChanges, now: DateTime<Utc>) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(email) = changes.email {
            self.email = email;
        }
        if let Some(role) = changes.role {
            self.role = role;
        }
        if let Some(hash) = changes.password_hash {
            self.password_hash = hash;
        }
        self.updated_at = now;
    }
}

/// A user about to be inserted; the store assigns the id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

impl NewUser {
    pub fn into_user(self, id: String, now: DateTime<Utc>) -> User {
        User {
            id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            role: self.role,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Mutable fields for a conditional update. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub password_hash: Option<String>,
}
