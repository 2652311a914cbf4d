use std::sync::Arc;

use common::storage::BlobStore;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::lifecycle::ResourceLifecycle;
use crate::media::MediaAttachmentManager;
use crate::schema::{ResourceSchema, SchemaRegistry};
use crate::store::RecordStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub blob_store: Arc<dyn BlobStore>,
    pub registry: Arc<SchemaRegistry>,
    pub config: AppConfig,
}

impl AppState {
    pub fn media(&self) -> MediaAttachmentManager {
        MediaAttachmentManager::new(
            self.blob_store.clone(),
            self.config.storage.max_upload_size,
        )
    }

    pub fn lifecycle_for(&self, schema: &'static ResourceSchema) -> ResourceLifecycle {
        ResourceLifecycle::new(schema, self.store.clone(), self.media())
    }

    /// Lifecycle of the resource mounted at `route`, e.g. `articles`.
    pub fn lifecycle(&self, route: &str) -> Result<ResourceLifecycle, AppError> {
        let schema = self
            .registry
            .by_route(route)
            .ok_or_else(|| AppError::NotFound(format!("Resource '{route}' not found")))?;
        Ok(self.lifecycle_for(schema))
    }
}
