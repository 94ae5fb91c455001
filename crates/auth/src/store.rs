//! Boundary between the session service and persistent user storage.
//!
//! Adapters live in the `storage` crate; the service only sees this trait.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{NewUser, User, UserChanges};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result of a conditional update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The record matched and every requested field was written.
    Updated(User),
    /// The record matched but already held the requested values; nothing
    /// was written and `updated_at` is unchanged.
    NoChange,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Insert a new user, assigning its id and setting both timestamps to
    /// the insertion instant. Rejects an email that is already registered.
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;

    /// Apply `changes` to the user with `id` as one atomic step: either all
    /// fields and `updated_at` become visible together, or nothing does.
    async fn conditional_update(
        &self,
        id: &str,
        changes: UserChanges,
    ) -> Result<UpdateOutcome, StoreError>;

    async fn delete(&self, id: &str) -> Result<DeleteOutcome, StoreError>;

    /// Snapshot of every user at call time.
    async fn list_all(&self) -> Result<Vec<User>, StoreError>;
}
