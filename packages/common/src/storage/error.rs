/// Failure of a [`BlobStore`](super::BlobStore) operation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("no blob stored under `{0}`")]
    NotFound(String),
    #[error("blob storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// The key is empty, absolute, or escapes the storage root.
    #[error("`{0}` is not a valid blob key")]
    InvalidKey(String),
    #[error("blob of {actual} bytes exceeds the {limit} byte limit")]
    SizeLimitExceeded { actual: u64, limit: u64 },
}
