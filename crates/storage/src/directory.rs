use std::collections::HashMap;

use auth::{DeleteOutcome, NewUser, StoreError, UpdateOutcome, User, UserChanges};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// The set of user records plus an email index.
///
/// Every mutation either completes or returns early before touching
/// anything, so callers holding a write lock never expose a half-applied
/// change.
#[derive(Debug, Clone, Default)]
pub(crate) struct Directory {
    users: HashMap<String, User>,
    by_email: HashMap<String, String>,
}

impl Directory {
    pub(crate) fn from_users(users: Vec<User>) -> Result<Self, StoreError> {
        let mut directory = Self::default();
        for user in users {
            if directory.by_email.contains_key(&user.email) {
                return Err(StoreError::DuplicateEmail(user.email));
            }
            directory.by_email.insert(user.email.clone(), user.id.clone());
            directory.users.insert(user.id.clone(), user);
        }
        Ok(directory)
    }

    pub(crate) fn get(&self, id: &str) -> Option<&User> {
        self.users.get(id)
    }

    pub(crate) fn get_by_email(&self, email: &str) -> Option<&User> {
        self.by_email.get(email).and_then(|id| self.users.get(id))
    }

    /// Users ordered by creation time, then id.
    pub(crate) fn snapshot(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        users
    }

    pub(crate) fn insert(&mut self, user: NewUser, now: DateTime<Utc>) -> Result<User, StoreError> {
        if self.by_email.contains_key(&user.email) {
            return Err(StoreError::DuplicateEmail(user.email));
        }

        let user = user.into_user(Uuid::new_v4().to_string(), now);
        self.by_email.insert(user.email.clone(), user.id.clone());
        self.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    pub(crate) fn update(
        &mut self,
        id: &str,
        changes: UserChanges,
        now: DateTime<Utc>,
    ) -> Result<UpdateOutcome, StoreError> {
        let Some(current) = self.users.get(id) else {
            return Ok(UpdateOutcome::NotFound);
        };

        if current.is_unchanged_by(&changes) {
            return Ok(UpdateOutcome::NoChange);
        }

        let old_email = current.email.clone();
        if let Some(email) = changes.email.as_ref().filter(|email| **email != old_email) {
            if self.by_email.contains_key(email) {
                return Err(StoreError::DuplicateEmail(email.clone()));
            }
        }

        let mut updated = current.clone();
        updated.apply(changes, now);

        if updated.email != old_email {
            self.by_email.remove(&old_email);
            self.by_email.insert(updated.email.clone(), updated.id.clone());
        }
        self.users.insert(updated.id.clone(), updated.clone());

        Ok(UpdateOutcome::Updated(updated))
    }

    pub(crate) fn delete(&mut self, id: &str) -> DeleteOutcome {
        match self.users.remove(id) {
            Some(user) => {
                self.by_email.remove(&user.email);
                DeleteOutcome::Deleted
            }
            None => DeleteOutcome::NotFound,
        }
    }
}
