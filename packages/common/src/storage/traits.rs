use async_trait::async_trait;

use super::error::StorageError;

/// Key-addressed blob storage.
///
/// Keys are relative, `/`-separated paths such as `articles/cover/intro-1700000000000.jpg`.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write bytes under `key`, replacing any existing blob.
    async fn write(&self, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Read all bytes stored under `key`.
    async fn read(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Check whether a blob exists under `key`.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Delete the blob under `key`.
    ///
    /// Returns `true` if the blob was deleted, `false` if it did not exist.
    async fn delete(&self, key: &str) -> Result<bool, StorageError>;
}
