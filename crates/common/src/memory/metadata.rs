use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{File, Share, User};
use crate::ports::{FileStore, ShareStore, StoreError, UserStore};

/// In-memory metadata store backing all three metadata ports.
///
/// Deleting a file drops its shares under the same write lock, matching the
/// cascade the SQLite store gets from its foreign keys.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryStoreInner>>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    users: HashMap<Uuid, User>,
    /// username -> user id
    usernames: HashMap<String, Uuid>,
    files: HashMap<Uuid, File>,
    shares: HashMap<Uuid, Share>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>, StoreError> {
        self.inner
            .read()
            .map_err(|e| anyhow::anyhow!("failed to acquire read lock: {}", e).into())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>, StoreError> {
        self.inner
            .write()
            .map_err(|e| anyhow::anyhow!("failed to acquire write lock: {}", e).into())
    }
}

#[async_trait]
impl FileStore for MemoryStore {
    async fn save(&self, file: &File) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if inner.files.contains_key(&file.id) {
            return Err(StoreError::Duplicate {
                entity: "file",
                key: file.id.to_string(),
            });
        }
        inner.files.insert(file.id, file.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<File>, StoreError> {
        Ok(self.read()?.files.get(&id).cloned())
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Vec<File>, StoreError> {
        let inner = self.read()?;
        let mut files: Vec<File> = inner
            .files
            .values()
            .filter(|f| f.owner_id == owner_id)
            .cloned()
            .collect();
        files.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(files)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if inner.files.remove(&id).is_none() {
            return Err(StoreError::not_found("file", id));
        }
        inner.shares.retain(|_, share| share.file_id != id);
        Ok(())
    }
}

#[async_trait]
impl ShareStore for MemoryStore {
    async fn save(&self, share: &Share) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        inner
            .shares
            .retain(|_, s| !(s.file_id == share.file_id && s.recipient_id == share.recipient_id));
        inner.shares.insert(share.id, share.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Share>, StoreError> {
        Ok(self.read()?.shares.get(&id).cloned())
    }

    async fn find_by_recipient(&self, recipient_id: Uuid) -> Result<Vec<Share>, StoreError> {
        let inner = self.read()?;
        let mut shares: Vec<Share> = inner
            .shares
            .values()
            .filter(|s| s.recipient_id == recipient_id)
            .cloned()
            .collect();
        shares.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(shares)
    }

    async fn find_active(
        &self,
        file_id: Uuid,
        recipient_id: Uuid,
    ) -> Result<Option<Share>, StoreError> {
        Ok(self
            .read()?
            .shares
            .values()
            .find(|s| s.file_id == file_id && s.recipient_id == recipient_id)
            .cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        match self.write()?.shares.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::not_found("share", id)),
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn save(&self, user: &User) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if inner.usernames.contains_key(&user.username) {
            return Err(StoreError::Duplicate {
                entity: "user",
                key: user.username.clone(),
            });
        }
        if inner.users.contains_key(&user.id) {
            return Err(StoreError::Duplicate {
                entity: "user",
                key: user.id.to_string(),
            });
        }
        inner.usernames.insert(user.username.clone(), user.id);
        inner.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let inner = self.read()?;
        Ok(inner
            .usernames
            .get(username)
            .and_then(|id| inner.users.get(id))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use time::{Duration, OffsetDateTime};

    use super::*;
    use crate::domain::NewFile;

    fn file_at(owner: Uuid, name: &str, created_at: OffsetDateTime) -> File {
        NewFile {
            created_at: Some(created_at),
            ..NewFile::new(name, "text/plain", 1)
        }
        .into_file(owner)
    }

    #[tokio::test]
    async fn test_find_by_owner_newest_first() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();

        for (name, age) in [("old", 20), ("new", 0), ("mid", 10)] {
            let file = file_at(owner, name, now - Duration::seconds(age));
            FileStore::save(&store, &file).await.unwrap();
        }
        let other = file_at(Uuid::new_v4(), "other", now);
        FileStore::save(&store, &other).await.unwrap();

        let names: Vec<String> = store
            .find_by_owner(owner)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.filename)
            .collect();
        assert_eq!(names, vec!["new", "mid", "old"]);
    }

    #[tokio::test]
    async fn test_file_delete_cascades_shares() {
        let store = MemoryStore::new();
        let file = file_at(Uuid::new_v4(), "a.txt", OffsetDateTime::now_utc());
        FileStore::save(&store, &file).await.unwrap();

        let share = Share::new(file.id, Uuid::new_v4(), b"k".to_vec());
        ShareStore::save(&store, &share).await.unwrap();

        FileStore::delete(&store, file.id).await.unwrap();
        assert!(ShareStore::find_by_id(&store, share.id).await.unwrap().is_none());

        let err = FileStore::delete(&store, file.id).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_share_save_replaces_pair() {
        let store = MemoryStore::new();
        let (file_id, recipient) = (Uuid::new_v4(), Uuid::new_v4());

        let first = Share::new(file_id, recipient, b"k1".to_vec());
        let second = Share::new(file_id, recipient, b"k2".to_vec());
        ShareStore::save(&store, &first).await.unwrap();
        ShareStore::save(&store, &second).await.unwrap();

        let active = store.find_active(file_id, recipient).await.unwrap().unwrap();
        assert_eq!(active.id, second.id);
        assert_eq!(active.wrapped_key, b"k2");
        assert_eq!(store.find_by_recipient(recipient).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_username_is_unique_and_case_sensitive() {
        let store = MemoryStore::new();
        let user = |name: &str| User {
            id: Uuid::new_v4(),
            username: name.to_string(),
            password_hash: String::new(),
            public_key: vec![1],
            encrypted_private_key: vec![2],
            created_at: OffsetDateTime::now_utc(),
        };

        UserStore::save(&store, &user("alice")).await.unwrap();
        UserStore::save(&store, &user("Alice")).await.unwrap();
        let err = UserStore::save(&store, &user("alice")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { entity: "user", .. }));

        assert!(store.find_by_username("ALICE").await.unwrap().is_none());
    }
}
