use async_trait::async_trait;
use auth::{DeleteOutcome, NewUser, StoreError, UpdateOutcome, User, UserChanges, UserStore};
use chrono::Utc;
use tokio::sync::RwLock;

use crate::directory::Directory;

/// Process-local user store.
///
/// Each mutation runs inside a single write-lock section, so a conditional
/// update is a compare-and-set: readers see the record before or after,
/// never in between.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    directory: RwLock<Directory>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.directory.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.directory.read().await.get_by_email(email).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        self.directory.write().await.insert(user, Utc::now())
    }

    async fn conditional_update(
        &self,
        id: &str,
        changes: UserChanges,
    ) -> Result<UpdateOutcome, StoreError> {
        self.directory.write().await.update(id, changes, Utc::now())
    }

    async fn delete(&self, id: &str) -> Result<DeleteOutcome, StoreError> {
        Ok(self.directory.write().await.delete(id))
    }

    async fn list_all(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.directory.read().await.snapshot())
    }
}
