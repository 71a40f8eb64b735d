//! Shared test utilities for access-control integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, StreamExt, TryStreamExt};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use common::access::{FileAccess, Identity, ShareAccess};
use common::crypto::{Argon2Hasher, PasswordError, PasswordHasher, PasswordParams};
use common::domain::{File, NewFile, User};
use common::memory::{MemoryContentStore, MemoryStore};
use common::ports::{ContentStore, ContentStream, FileStore, ShareStore, StoreError, UserStore};

/// Memory-backed stores with every usecase wired over them
pub struct Harness {
    pub store: MemoryStore,
    pub content: MemoryContentStore,
    pub files: FileAccess,
    pub shares: ShareAccess,
    pub identity: Identity,
    pub cancel: CancellationToken,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_content(MemoryContentStore::new())
    }

    pub fn with_content(content: MemoryContentStore) -> Self {
        let store = MemoryStore::new();
        let blobs: Arc<dyn ContentStore> = Arc::new(content.clone());
        Self::build(store.clone(), Arc::new(store), blobs, content)
    }

    /// Content calls go through a [`ScriptedContentStore`] sharing the
    ///  harness cancellation token
    pub fn scripted(configure: impl FnOnce(&mut ScriptedContentStore)) -> Self {
        let content = MemoryContentStore::new();
        let cancel = CancellationToken::new();
        let mut scripted = ScriptedContentStore::new(content.clone(), cancel.clone());
        configure(&mut scripted);

        let store = MemoryStore::new();
        let mut harness = Self::build(store.clone(), Arc::new(store), Arc::new(scripted), content);
        harness.cancel = cancel;
        harness
    }

    /// Wire `files` in place of the memory file store
    pub fn build(
        store: MemoryStore,
        files: Arc<dyn FileStore>,
        blobs: Arc<dyn ContentStore>,
        content: MemoryContentStore,
    ) -> Self {
        let shares: Arc<dyn ShareStore> = Arc::new(store.clone());
        let users: Arc<dyn UserStore> = Arc::new(store.clone());
        let hasher = fast_hasher();

        Self {
            files: FileAccess::new(files.clone(), shares.clone(), blobs),
            shares: ShareAccess::new(files, shares, users.clone()),
            identity: Identity::new(users, hasher),
            store,
            content,
            cancel: CancellationToken::new(),
        }
    }

    pub async fn register(&self, username: &str) -> User {
        self.identity
            .register(
                &self.cancel,
                username,
                "pw",
                format!("{}-public", username).into_bytes(),
                format!("{}-private", username).into_bytes(),
            )
            .await
            .unwrap()
    }

    pub async fn upload(&self, owner: &User, filename: &str, data: &'static [u8]) -> File {
        let new = NewFile::new(filename, "text/plain", data.len() as u64)
            .with_key_material(b"iv-123".to_vec(), b"owner-wrapped".to_vec());
        self.files
            .upload(&self.cancel, owner.id, new, body(data))
            .await
            .unwrap()
    }
}

pub fn fast_hasher() -> Arc<Argon2Hasher> {
    Arc::new(Argon2Hasher::new(PasswordParams::insecure_fast()).unwrap())
}

pub fn body(data: &'static [u8]) -> ContentStream {
    stream::once(async move { Ok(Bytes::from_static(data)) }).boxed()
}

/// Body that yields to the scheduler before producing its bytes
pub fn yielding_body(data: &'static [u8]) -> ContentStream {
    stream::once(async move {
        tokio::task::yield_now().await;
        Ok(Bytes::from_static(data))
    })
    .boxed()
}

pub async fn read_all(content: ContentStream) -> Vec<u8> {
    let chunks: Vec<Bytes> = content.try_collect().await.unwrap();
    chunks.concat()
}

fn unavailable(what: &str) -> StoreError {
    StoreError::Unavailable(anyhow::anyhow!("{} is down", what))
}

/// File store that can be told to fail writes
pub struct FlakyFileStore {
    pub inner: MemoryStore,
    pub fail_save: AtomicBool,
    pub fail_delete: AtomicBool,
}

impl FlakyFileStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            fail_save: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl FileStore for FlakyFileStore {
    async fn save(&self, file: &File) -> Result<(), StoreError> {
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(unavailable("metadata store"));
        }
        FileStore::save(&self.inner, file).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<File>, StoreError> {
        FileStore::find_by_id(&self.inner, id).await
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Vec<File>, StoreError> {
        self.inner.find_by_owner(owner_id).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(unavailable("metadata store"));
        }
        FileStore::delete(&self.inner, id).await
    }
}

/// User store whose lookups and writes can be told to fail
pub struct FlakyUserStore {
    pub inner: MemoryStore,
    pub fail_lookup: AtomicBool,
    pub fail_save: AtomicBool,
}

impl FlakyUserStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            fail_lookup: AtomicBool::new(false),
            fail_save: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl UserStore for FlakyUserStore {
    async fn save(&self, user: &User) -> Result<(), StoreError> {
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(unavailable("user store"));
        }
        UserStore::save(&self.inner, user).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        if self.fail_lookup.load(Ordering::SeqCst) {
            return Err(unavailable("user store"));
        }
        UserStore::find_by_id(&self.inner, id).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        if self.fail_lookup.load(Ordering::SeqCst) {
            return Err(unavailable("user store"));
        }
        self.inner.find_by_username(username).await
    }
}

/// Hasher whose key derivation always fails
pub struct FailingHasher;

impl PasswordHasher for FailingHasher {
    fn hash(&self, _password: &[u8]) -> Result<String, PasswordError> {
        Err(PasswordError::Derivation(argon2::Error::OutputTooShort))
    }

    fn verify(&self, _password: &[u8], _digest: &str) -> Result<bool, PasswordError> {
        Ok(false)
    }

    fn dummy_digest(&self) -> &str {
        ""
    }
}

/// How a [`ScriptedContentStore`] behaves on each call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Script {
    /// Delegate to the memory store
    Pass,
    /// Return an unavailable error
    Fail,
    /// Never complete
    Hang,
    /// Delegate, then fire the cancellation token
    PassThenCancel,
}

/// Content store wrapper with per-operation behavior
pub struct ScriptedContentStore {
    pub inner: MemoryContentStore,
    pub put: Script,
    pub get: Script,
    pub delete: Script,
    pub cancel: CancellationToken,
}

impl ScriptedContentStore {
    pub fn new(inner: MemoryContentStore, cancel: CancellationToken) -> Self {
        Self {
            inner,
            put: Script::Pass,
            get: Script::Pass,
            delete: Script::Pass,
            cancel,
        }
    }

    async fn gate(&self, script: Script) -> Result<(), StoreError> {
        match script {
            Script::Fail => Err(unavailable("content store")),
            Script::Hang => futures::future::pending().await,
            Script::Pass | Script::PassThenCancel => Ok(()),
        }
    }

    fn after(&self, script: Script) {
        if script == Script::PassThenCancel {
            self.cancel.cancel();
        }
    }
}

#[async_trait]
impl ContentStore for ScriptedContentStore {
    async fn put(
        &self,
        key: &str,
        content: ContentStream,
        length: u64,
        content_type: &str,
    ) -> Result<(), StoreError> {
        self.gate(self.put).await?;
        self.inner.put(key, content, length, content_type).await?;
        self.after(self.put);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<ContentStream, StoreError> {
        self.gate(self.get).await?;
        let content = self.inner.get(key).await?;
        self.after(self.get);
        Ok(content)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.gate(self.delete).await?;
        self.inner.delete(key).await?;
        self.after(self.delete);
        Ok(())
    }
}
