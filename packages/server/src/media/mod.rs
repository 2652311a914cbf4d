//! Image uploads for media slots.
//!
//! Every stored upload is a pair: the original bytes under
//! `{folder}/{slug}-{stamp}.{ext}` and an exact-size thumbnail under
//! `{folder}/thumbnail/{slug}-thumbnail-{stamp}.{ext}`. A pair is written
//! whole or not at all.

mod thumbnail;

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use axum::body::Bytes;
use chrono::Utc;
use common::storage::{BlobStore, StorageError};
use tracing::{debug, warn};

use crate::schema::ThumbnailSize;
use crate::store::MediaPair;
use crate::utils::filename::image_extension;
use crate::utils::slug::slugify;

/// An uploaded file, fully buffered.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to remove {}", describe_failures(.0))]
    Cleanup(Vec<(String, StorageError)>),
}

fn describe_failures(failures: &[(String, StorageError)]) -> String {
    failures
        .iter()
        .map(|(path, err)| format!("{path} ({err})"))
        .collect::<Vec<_>>()
        .join(", ")
}

static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

/// Millisecond timestamp that strictly increases across calls in this process,
/// so two uploads never share a name even within the same clock tick.
pub fn next_stamp() -> i64 {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_STAMP.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_STAMP.compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

/// Blob keys for a new pair.
fn pair_keys(base_name_hint: &str, folder: &str, ext: &str, stamp: i64) -> MediaPair {
    let stem = match slugify(base_name_hint) {
        s if s.is_empty() => "file".to_string(),
        s => s,
    };
    MediaPair {
        path: format!("{folder}/{stem}-{stamp}.{ext}"),
        thumbnail: format!("{folder}/thumbnail/{stem}-thumbnail-{stamp}.{ext}"),
    }
}

#[derive(Clone)]
pub struct MediaAttachmentManager {
    blobs: Arc<dyn BlobStore>,
    max_upload_size: u64,
}

impl MediaAttachmentManager {
    pub fn new(blobs: Arc<dyn BlobStore>, max_upload_size: u64) -> Self {
        Self {
            blobs,
            max_upload_size,
        }
    }

    /// Reject an upload before anything is written: bad filename, disallowed
    /// extension, oversize, or bytes that are not an image.
    pub fn check_upload(&self, upload: &Upload) -> Result<(), String> {
        image_extension(&upload.file_name).map_err(|e| e.message())?;

        if upload.bytes.is_empty() {
            return Err("The uploaded file is empty.".into());
        }
        if upload.bytes.len() as u64 > self.max_upload_size {
            return Err(format!(
                "The uploaded file must not be greater than {} bytes.",
                self.max_upload_size
            ));
        }
        if !thumbnail::sniff(&upload.bytes) {
            return Err("The uploaded file must be an image.".into());
        }
        Ok(())
    }

    /// Write the original and its thumbnail, returning both keys.
    ///
    /// The thumbnail is rendered before anything is written. If the thumbnail
    /// write fails, the already written original is deleted again.
    pub async fn store(
        &self,
        upload: &Upload,
        base_name_hint: &str,
        folder: &str,
        size: ThumbnailSize,
    ) -> Result<MediaPair, MediaError> {
        let ext = image_extension(&upload.file_name)
            .map_err(|e| MediaError::InvalidImage(e.message()))?;

        let bytes = upload.bytes.clone();
        let render_ext = ext.clone();
        let thumb = tokio::task::spawn_blocking(move || thumbnail::render(&bytes, &render_ext, size))
            .await
            .map_err(|e| MediaError::InvalidImage(format!("thumbnail task failed: {e}")))?
            .map_err(MediaError::InvalidImage)?;

        let pair = pair_keys(base_name_hint, folder, &ext, next_stamp());

        self.blobs.write(&pair.path, &upload.bytes).await?;

        if let Err(err) = self.blobs.write(&pair.thumbnail, &thumb).await {
            if let Err(rollback) = self.remove(&pair.path).await {
                warn!(path = %pair.path, error = %rollback, "Failed to roll back original after thumbnail write failure");
            }
            return Err(err.into());
        }

        debug!(path = %pair.path, thumbnail = %pair.thumbnail, "Stored media pair");
        Ok(pair)
    }

    /// Delete a blob. Empty paths and missing blobs are not errors.
    pub async fn remove(&self, path: &str) -> Result<(), StorageError> {
        if path.is_empty() || !self.blobs.exists(path).await? {
            return Ok(());
        }
        self.blobs.delete(path).await?;
        Ok(())
    }

    /// Delete both halves of a pair. Both deletions are attempted; every
    /// failure is reported together.
    pub async fn remove_pair(&self, pair: &MediaPair) -> Result<(), MediaError> {
        let mut failures = Vec::new();
        for path in [&pair.path, &pair.thumbnail] {
            if let Err(err) = self.remove(path).await {
                failures.push((path.clone(), err));
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(MediaError::Cleanup(failures))
        }
    }
}
