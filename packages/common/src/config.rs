use std::path::PathBuf;

use serde::Deserialize;

/// Which blob store implementation backs media uploads.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Filesystem,
    Memory,
}

/// App-level blob storage configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Storage backend. Default: filesystem.
    #[serde(default)]
    pub backend: StorageBackend,
    /// Root directory for the filesystem backend. Default: "./storage".
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
    /// Maximum size of a single uploaded file in bytes. Default: 8 MiB.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("./storage")
}
fn default_max_upload_size() -> u64 {
    8 * 1024 * 1024
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            root: default_storage_root(),
            max_upload_size: default_max_upload_size(),
        }
    }
}
