//! Object storage backend (S3/MinIO/local filesystem/memory) for file content.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::BytesMut;
use common::ports::{ContentStore, ContentStream, StoreError};
use futures::{StreamExt, TryStreamExt};
use object_store::aws::{AmazonS3Builder, S3ConditionalPut};
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{Attribute, Attributes, ObjectStore, PutMode, PutOptions, PutPayload};
use serde::{Deserialize, Serialize};

use crate::error::{object_error, Result, StorageSetupError};

/// Prefix under which file content is stored.
const FILES_PREFIX: &str = "files";

/// Configuration for the object storage backend.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectStoreConfig {
    /// In-memory storage (for testing)
    #[default]
    Memory,

    /// Local filesystem storage
    Local {
        /// Path to the storage directory
        path: PathBuf,
    },

    /// S3-compatible storage (AWS S3, MinIO, etc.)
    S3 {
        /// S3 endpoint URL (e.g., "http://localhost:9000" for MinIO)
        endpoint: String,
        /// Access key ID
        access_key: String,
        /// Secret access key
        secret_key: String,
        /// Bucket name
        bucket: String,
        /// Optional region (defaults to "us-east-1")
        region: Option<String>,
    },
}

/// Content store over any `object_store` backend.
#[derive(Debug, Clone)]
pub struct Storage {
    inner: Arc<dyn ObjectStore>,
    /// The local filesystem backend rejects object attributes
    content_type_attribute: bool,
}

impl Storage {
    /// Create a new storage backend from configuration.
    pub async fn new(config: ObjectStoreConfig) -> Result<Self> {
        let storage = match &config {
            ObjectStoreConfig::Memory => Self::memory(),

            ObjectStoreConfig::Local { path } => {
                // Ensure directory exists
                tokio::fs::create_dir_all(path).await?;
                Self {
                    inner: Arc::new(
                        LocalFileSystem::new_with_prefix(path)
                            .map_err(|e| StorageSetupError::InvalidConfig(e.to_string()))?,
                    ),
                    content_type_attribute: false,
                }
            }

            ObjectStoreConfig::S3 {
                endpoint,
                access_key,
                secret_key,
                bucket,
                region,
            } => {
                let builder = AmazonS3Builder::new()
                    .with_endpoint(endpoint)
                    .with_access_key_id(access_key)
                    .with_secret_access_key(secret_key)
                    .with_bucket_name(bucket)
                    .with_region(region.as_deref().unwrap_or("us-east-1"))
                    .with_allow_http(endpoint.starts_with("http://"))
                    // Create-only puts are sent as `If-None-Match: *`
                    .with_conditional_put(S3ConditionalPut::ETagMatch);

                let store: Arc<dyn ObjectStore> = Arc::new(
                    builder
                        .build()
                        .map_err(|e| StorageSetupError::InvalidConfig(e.to_string()))?,
                );

                // Fail fast if the bucket doesn't exist
                {
                    let prefix = ObjectPath::from(FILES_PREFIX);
                    let mut stream = store.list(Some(&prefix));
                    match stream.try_next().await {
                        Ok(_) => {}
                        Err(object_store::Error::NotFound { .. }) => {
                            return Err(StorageSetupError::BucketNotFound(bucket.clone()));
                        }
                        Err(e) => {
                            let msg = e.to_string();
                            if msg.contains("NoSuchBucket") {
                                return Err(StorageSetupError::BucketNotFound(bucket.clone()));
                            }
                            return Err(e.into());
                        }
                    }
                }

                Self {
                    inner: store,
                    content_type_attribute: true,
                }
            }
        };

        tracing::info!(backend = %storage.inner, "object storage ready");
        Ok(storage)
    }

    /// Create an in-memory storage backend.
    pub fn memory() -> Self {
        Self {
            inner: Arc::new(InMemory::new()),
            content_type_attribute: true,
        }
    }

    /// Build the object path for file content.
    fn content_path(key: &str) -> ObjectPath {
        ObjectPath::from(format!("{}/{}", FILES_PREFIX, key))
    }

    /// Check if content exists in storage.
    pub async fn has_content(&self, key: &str) -> std::result::Result<bool, StoreError> {
        match self.inner.head(&Self::content_path(key)).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(object_error(key, e)),
        }
    }

    /// List the keys of all stored content, for orphan sweeps.
    pub async fn list_keys(&self) -> std::result::Result<Vec<String>, StoreError> {
        let prefix = ObjectPath::from(FILES_PREFIX);
        let items: Vec<_> = self
            .inner
            .list(Some(&prefix))
            .try_collect()
            .await
            .map_err(|e| object_error(FILES_PREFIX, e))?;

        Ok(items
            .into_iter()
            .filter_map(|meta| meta.location.filename().map(str::to_string))
            .collect())
    }
}

#[async_trait]
impl ContentStore for Storage {
    async fn put(
        &self,
        key: &str,
        content: ContentStream,
        length: u64,
        content_type: &str,
    ) -> std::result::Result<(), StoreError> {
        // Buffer what arrives, bounded by the declared length
        let mut buf = BytesMut::new();
        let mut content = content;
        while let Some(chunk) = content.next().await {
            let chunk = chunk?;
            if (buf.len() + chunk.len()) as u64 > length {
                return Err(StoreError::Invalid(format!(
                    "content exceeds declared length of {} bytes",
                    length
                )));
            }
            buf.extend_from_slice(&chunk);
        }
        if buf.len() as u64 != length {
            return Err(StoreError::Invalid(format!(
                "declared length {} but received {} bytes",
                length,
                buf.len()
            )));
        }

        let mut opts = PutOptions::from(PutMode::Create);
        if self.content_type_attribute {
            let mut attributes = Attributes::new();
            attributes.insert(Attribute::ContentType, content_type.to_string().into());
            opts.attributes = attributes;
        }

        self.inner
            .put_opts(
                &Self::content_path(key),
                PutPayload::from(buf.freeze()),
                opts,
            )
            .await
            .map_err(|e| object_error(key, e))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> std::result::Result<ContentStream, StoreError> {
        let result = self
            .inner
            .get(&Self::content_path(key))
            .await
            .map_err(|e| object_error(key, e))?;

        let key = key.to_string();
        Ok(result
            .into_stream()
            .map_err(move |e| object_error(&key, e))
            .boxed())
    }

    async fn delete(&self, key: &str) -> std::result::Result<(), StoreError> {
        // Ignore NotFound errors - the content may already be deleted
        match self.inner.delete(&Self::content_path(key)).await {
            Ok(()) => Ok(()),
            Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(object_error(key, e)),
        }
    }
}
