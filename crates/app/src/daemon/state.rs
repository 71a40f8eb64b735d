use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use common::crypto::{Argon2Hasher, PasswordError, PasswordParams};
use common::memory::{MemoryContentStore, MemoryStore};
use common::prelude::{FileAccess, Identity, ShareAccess};
use sealdrop_object_store::{Database, Storage, StorageSetupError};

use super::config::Config;
use super::http_server::health::data_source::{DbSource, DynDataSource, MemorySource};
use super::session::SessionSigner;

/// Main service state, shared by every request handler
#[derive(Clone)]
pub struct State {
    files: FileAccess,
    shares: ShareAccess,
    identity: Identity,
    sessions: SessionSigner,
    readiness: DynDataSource,
    shutdown: CancellationToken,
    database: Option<Database>,
}

impl State {
    pub async fn from_config(
        config: &Config,
        shutdown: CancellationToken,
    ) -> Result<Self, StateSetupError> {
        let database = match &config.sqlite_path {
            Some(path) => Database::new(path).await?,
            None => {
                tracing::warn!("no sqlite path configured, metadata will not persist");
                Database::in_memory().await?
            }
        };
        let storage = Arc::new(Storage::new(config.blob_store.clone()).await?);
        let hasher = Arc::new(Argon2Hasher::new(config.password)?);

        let metadata = Arc::new(database.clone());
        let files = FileAccess::new(metadata.clone(), metadata.clone(), storage);
        let shares = ShareAccess::new(metadata.clone(), metadata.clone(), metadata.clone());
        let identity = Identity::new(metadata, hasher);

        let readiness: DynDataSource =
            Arc::new(DbSource::new(database.clone(), shutdown.clone()));

        Ok(Self {
            files,
            shares,
            identity,
            sessions: SessionSigner::new(config.session_key.clone(), config.session_ttl),
            readiness,
            shutdown,
            database: Some(database),
        })
    }

    /// State backed entirely by process memory.
    pub fn in_memory(
        sessions: SessionSigner,
        password: PasswordParams,
        shutdown: CancellationToken,
    ) -> Result<Self, StateSetupError> {
        let store = Arc::new(MemoryStore::new());
        let content = Arc::new(MemoryContentStore::new());
        let hasher = Arc::new(Argon2Hasher::new(password)?);

        Ok(Self {
            files: FileAccess::new(store.clone(), store.clone(), content),
            shares: ShareAccess::new(store.clone(), store.clone(), store.clone()),
            identity: Identity::new(store, hasher),
            sessions,
            readiness: Arc::new(MemorySource::new(shutdown.clone())),
            shutdown,
            database: None,
        })
    }

    pub fn files(&self) -> &FileAccess {
        &self.files
    }

    pub fn shares(&self) -> &ShareAccess {
        &self.shares
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn sessions(&self) -> &SessionSigner {
        &self.sessions
    }

    pub fn readiness(&self) -> &DynDataSource {
        &self.readiness
    }

    /// Cancelled once the process starts shutting down
    pub fn shutdown(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Release the database pool, if any.
    pub async fn close(&self) {
        if let Some(database) = &self.database {
            database.close().await;
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("storage setup error: {0}")]
    Storage(#[from] StorageSetupError),
    #[error("password hasher setup error: {0}")]
    Password(#[from] PasswordError),
}
