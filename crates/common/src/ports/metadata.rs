use async_trait::async_trait;
use uuid::Uuid;

use super::StoreError;
use crate::domain::{File, Share, User};

/// Durable file metadata.
#[async_trait]
pub trait FileStore: Send + Sync + 'static {
    /// Persist a new file record
    ///
    /// * `Err(StoreError::Duplicate)` - a file with this id already exists
    async fn save(&self, file: &File) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<File>, StoreError>;

    /// All files owned by `owner_id`, newest first
    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Vec<File>, StoreError>;

    /// Remove a file record along with every share that references it.
    ///
    /// * `Err(StoreError::NotFound)` - no file with this id
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

/// Durable share grants.
#[async_trait]
pub trait ShareStore: Send + Sync + 'static {
    /// Persist a grant, replacing any existing grant for the same
    ///  `(file_id, recipient_id)` pair
    async fn save(&self, share: &Share) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Share>, StoreError>;

    /// All grants held by `recipient_id`, newest first
    async fn find_by_recipient(&self, recipient_id: Uuid) -> Result<Vec<Share>, StoreError>;

    /// The grant for `(file_id, recipient_id)`, if any
    async fn find_active(
        &self,
        file_id: Uuid,
        recipient_id: Uuid,
    ) -> Result<Option<Share>, StoreError>;

    /// * `Err(StoreError::NotFound)` - no share with this id
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

/// Durable user accounts.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    /// * `Err(StoreError::Duplicate)` - the username is taken
    async fn save(&self, user: &User) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Usernames are matched case-sensitively
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
}
