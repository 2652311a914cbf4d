mod error;
mod traits;

pub mod filesystem;
pub mod memory;

pub use error::StorageError;
pub use traits::BlobStore;
