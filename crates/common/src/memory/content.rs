use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::{stream, StreamExt, TryStreamExt};

use crate::ports::{ContentStore, ContentStream, StoreError};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: String,
}

/// In-memory content store.
#[derive(Debug, Clone, Default)]
pub struct MemoryContentStore {
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects
            .read()
            .map(|objects| objects.contains_key(key))
            .unwrap_or(false)
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects
            .read()
            .ok()
            .and_then(|objects| objects.get(key).map(|o| o.content_type.clone()))
    }

    pub fn len(&self) -> usize {
        self.objects.read().map(|objects| objects.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn put(
        &self,
        key: &str,
        content: ContentStream,
        length: u64,
        content_type: &str,
    ) -> Result<(), StoreError> {
        let data = content
            .try_fold(BytesMut::new(), |mut buf, chunk| async move {
                buf.extend_from_slice(&chunk);
                Ok(buf)
            })
            .await?
            .freeze();

        if data.len() as u64 != length {
            return Err(StoreError::Invalid(format!(
                "declared length {} but received {} bytes",
                length,
                data.len()
            )));
        }

        let mut objects = self
            .objects
            .write()
            .map_err(|e| anyhow::anyhow!("failed to acquire write lock: {}", e))?;
        match objects.entry(key.to_string()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate {
                entity: "content",
                key: key.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(StoredObject {
                    data,
                    content_type: content_type.to_string(),
                });
                Ok(())
            }
        }
    }

    async fn get(&self, key: &str) -> Result<ContentStream, StoreError> {
        let objects = self
            .objects
            .read()
            .map_err(|e| anyhow::anyhow!("failed to acquire read lock: {}", e))?;
        let object = objects
            .get(key)
            .ok_or_else(|| StoreError::not_found("content", key))?;
        Ok(stream::once(futures::future::ready(Ok(object.data.clone()))).boxed())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.objects
            .write()
            .map_err(|e| anyhow::anyhow!("failed to acquire write lock: {}", e))?
            .remove(key);
        Ok(())
    }
}
