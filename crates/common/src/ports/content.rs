use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use super::StoreError;

/// Ciphertext flowing in or out of a [`ContentStore`].
pub type ContentStream = BoxStream<'static, Result<Bytes, StoreError>>;

/// Opaque byte storage keyed by file identity.
#[async_trait]
pub trait ContentStore: Send + Sync + 'static {
    /// Store `length` bytes under `key`.
    ///
    /// * `Err(StoreError::Duplicate)` - `key` already holds an object, which
    ///   is left untouched
    /// * `Err(StoreError::Invalid)` - the stream did not carry exactly
    ///   `length` bytes
    async fn put(
        &self,
        key: &str,
        content: ContentStream,
        length: u64,
        content_type: &str,
    ) -> Result<(), StoreError>;

    /// * `Err(StoreError::NotFound)` - nothing stored under `key`
    async fn get(&self, key: &str) -> Result<ContentStream, StoreError>;

    /// Remove the object. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
