use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use common::storage::StorageError;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::state::AppState;
use crate::utils::filename::validate_media_path;

#[utoipa::path(
    get,
    path = "/media/{path}",
    tag = "Media",
    operation_id = "getMedia",
    summary = "Serve a stored image or thumbnail",
    description = "Streams the blob stored under `path`, e.g. \
        `articles/cover/thumbnail/hello-world-thumbnail-1718000000000.jpg`. Public.",
    params(("path" = String, Path, description = "Blob key as returned in a record's `media`")),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream"),
        (status = 404, description = "No such file (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_media(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    let not_found = || AppError::NotFound(format!("Media '{path}' not found"));
    let key = validate_media_path(&path).map_err(|_| not_found())?;

    let bytes = match state.blob_store.read(key).await {
        Ok(bytes) => bytes,
        Err(StorageError::NotFound(_) | StorageError::InvalidKey(_)) => return Err(not_found()),
        Err(e) => return Err(AppError::Storage(e.to_string())),
    };

    let content_type = mime_guess::from_path(key).first_or_octet_stream();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type.as_ref())
        .header(header::CONTENT_LENGTH, bytes.len().to_string())
        .header(header::CACHE_CONTROL, "public, max-age=86400")
        .body(Body::from(bytes))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}
