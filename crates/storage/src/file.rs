use std::path::{Path, PathBuf};

use async_trait::async_trait;
use auth::{DeleteOutcome, NewUser, StoreError, UpdateOutcome, User, UserChanges, UserStore};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::directory::Directory;

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Document {
    version: u32,
    users: Vec<User>,
}

/// User store persisted as a single JSON document.
///
/// Mutations are staged on a copy of the directory, written to a temporary
/// sibling file and renamed over the document while the write lock is held.
/// The in-memory state only moves forward after the rename succeeds, so a
/// failed write leaves both memory and disk as they were.
#[derive(Debug)]
pub struct FileUserStore {
    path: PathBuf,
    directory: RwLock<Directory>,
}

impl FileUserStore {
    /// Open the store at `path`, creating parent directories as needed.
    ///
    /// A missing file is an empty directory; it is written on the first
    /// mutation.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let directory = match fs::read(&path).await {
            Ok(bytes) => {
                let document: Document = serde_json::from_slice(&bytes)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                if document.version != FORMAT_VERSION {
                    return Err(StoreError::Serialization(format!(
                        "unsupported document version {}",
                        document.version
                    )));
                }
                Directory::from_users(document.users)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Directory::default(),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(path = %path.display(), "user store opened");

        Ok(Self {
            path,
            directory: RwLock::new(directory),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, directory: &Directory) -> Result<(), StoreError> {
        let document = Document {
            version: FORMAT_VERSION,
            users: directory.snapshot(),
        };
        let json = serde_json::to_vec_pretty(&document)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let tmp_path = self.path.with_extension("tmp");
        let written = match write_synced(&tmp_path, &json).await {
            Ok(()) => fs::rename(&tmp_path, &self.path).await,
            Err(e) => Err(e),
        };

        if let Err(e) = written {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        Ok(())
    }

    /// Run `mutate` against a copy of the directory and commit it only if
    /// the copy was persisted.
    async fn commit<T>(
        &self,
        changed: impl Fn(&T) -> bool,
        mutate: impl FnOnce(&mut Directory) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.directory.write().await;
        let mut staged = guard.clone();
        let result = mutate(&mut staged)?;

        if changed(&result) {
            self.persist(&staged).await.inspect_err(|e| {
                tracing::error!(path = %self.path.display(), error = %e, "user store write failed");
            })?;
            *guard = staged;
        }

        Ok(result)
    }
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await
}

#[async_trait]
impl UserStore for FileUserStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.directory.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.directory.read().await.get_by_email(email).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        self.commit(|_| true, |directory| directory.insert(user, Utc::now()))
            .await
    }

    async fn conditional_update(
        &self,
        id: &str,
        changes: UserChanges,
    ) -> Result<UpdateOutcome, StoreError> {
        self.commit(
            |outcome| matches!(outcome, UpdateOutcome::Updated(_)),
            |directory| directory.update(id, changes, Utc::now()),
        )
        .await
    }

    async fn delete(&self, id: &str) -> Result<DeleteOutcome, StoreError> {
        self.commit(
            |outcome| *outcome == DeleteOutcome::Deleted,
            |directory| Ok(directory.delete(id)),
        )
        .await
    }

    async fn list_all(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.directory.read().await.snapshot())
    }
}
