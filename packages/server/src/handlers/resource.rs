use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::form::ResourceForm;
use crate::lifecycle::ListQuery;
use crate::models::resource::{
    DeletedResponse, RecordListResponse, RecordResponse, RestoreAllResponse,
};
use crate::models::shared::ApiResponse;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/{resource}",
    tag = "Resources",
    operation_id = "listResources",
    summary = "List active records",
    description = "Returns a page of active (not trashed) records. `search` is matched \
        case-insensitively against every searchable field of the resource. Sorting defaults to \
        `id` ascending; ties are always broken by `id` ascending. Requires `{scope}:read`.",
    params(
        ("resource" = String, Path, description = "Resource collection, e.g. `articles`"),
        ListQuery,
    ),
    responses(
        (status = 200, description = "Page of records", body = ApiResponse<RecordListResponse>),
        (status = 400, description = "Malformed list parameters (INVALID_PARAMETER)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown resource (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_records(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<RecordListResponse>>, AppError> {
    let lifecycle = state.lifecycle(&resource)?;
    let schema = lifecycle.schema();
    auth_user.require_permission(&schema.scope.read())?;

    let page = lifecycle.list(&query).await?;
    Ok(Json(ApiResponse::ok(
        format!("{} list retrieved successfully", schema.label),
        RecordListResponse::from_page(schema, page),
    )))
}

#[utoipa::path(
    get,
    path = "/{resource}/trash",
    tag = "Resources",
    operation_id = "listTrashedResources",
    summary = "List trashed records",
    description = "Same filter, sort and pagination contract as the active listing, scoped to \
        records in the trash. Requires `{scope}:read`.",
    params(
        ("resource" = String, Path, description = "Resource collection, e.g. `articles`"),
        ListQuery,
    ),
    responses(
        (status = 200, description = "Page of trashed records", body = ApiResponse<RecordListResponse>),
        (status = 400, description = "Malformed list parameters (INVALID_PARAMETER)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown resource (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_trashed_records(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<RecordListResponse>>, AppError> {
    let lifecycle = state.lifecycle(&resource)?;
    let schema = lifecycle.schema();
    auth_user.require_permission(&schema.scope.read())?;

    let page = lifecycle.list_trashed(&query).await?;
    Ok(Json(ApiResponse::ok(
        format!("Trashed {} list retrieved successfully", schema.label.to_lowercase()),
        RecordListResponse::from_page(schema, page),
    )))
}

#[utoipa::path(
    post,
    path = "/{resource}",
    tag = "Resources",
    operation_id = "createResource",
    summary = "Create a record",
    description = "Accepts `application/json` or `multipart/form-data`. In multipart bodies, file \
        parts named after a media slot (e.g. `cover`) are stored with a generated thumbnail. \
        Every rule is checked before any file is written. Requires `{scope}:write`.",
    params(("resource" = String, Path, description = "Resource collection, e.g. `articles`")),
    request_body(content = Object, description = "Field values; multipart parts for uploads", content_type = "application/json"),
    responses(
        (status = 201, description = "Record created", body = ApiResponse<RecordResponse>),
        (status = 400, description = "Unreadable body (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown resource (NOT_FOUND)", body = ErrorBody),
        (status = 413, description = "Body too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
        (status = 422, description = "Validation failed (VALIDATION_ERROR)", body = ErrorBody),
        (status = 500, description = "File storage failed (STORAGE_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, form))]
pub async fn create_record(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(resource): Path<String>,
    ResourceForm(form): ResourceForm,
) -> Result<impl IntoResponse, AppError> {
    let lifecycle = state.lifecycle(&resource)?;
    let schema = lifecycle.schema();
    auth_user.require_permission(&schema.scope.write())?;

    let record = lifecycle.create(form, auth_user.actor()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            format!("{} created successfully", schema.label),
            RecordResponse::from_record(schema, record),
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/{resource}/{id}",
    tag = "Resources",
    operation_id = "getResource",
    summary = "Get an active record",
    description = "Trashed records are not returned. Requires `{scope}:read`.",
    params(
        ("resource" = String, Path, description = "Resource collection, e.g. `articles`"),
        ("id" = i32, Path, description = "Record ID"),
    ),
    responses(
        (status = 200, description = "Record", body = ApiResponse<RecordResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found or trashed (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn get_record(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, i32)>,
) -> Result<Json<ApiResponse<RecordResponse>>, AppError> {
    let lifecycle = state.lifecycle(&resource)?;
    let schema = lifecycle.schema();
    auth_user.require_permission(&schema.scope.read())?;

    let record = lifecycle.get(id).await?;
    Ok(Json(ApiResponse::ok(
        format!("{} retrieved successfully", schema.label),
        RecordResponse::from_record(schema, record),
    )))
}

#[utoipa::path(
    put,
    path = "/{resource}/{id}",
    tag = "Resources",
    operation_id = "updateResource",
    summary = "Update an active record",
    description = "Fields not sent keep their current values; the merged record is validated as \
        a whole. An upload for a slot that already holds an image replaces it, and the old \
        files are removed once the update is saved. Requires `{scope}:write`.",
    params(
        ("resource" = String, Path, description = "Resource collection, e.g. `articles`"),
        ("id" = i32, Path, description = "Record ID"),
    ),
    request_body(content = Object, description = "Field values; multipart parts for uploads", content_type = "application/json"),
    responses(
        (status = 200, description = "Record updated", body = ApiResponse<RecordResponse>),
        (status = 400, description = "Unreadable body (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found or trashed (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation failed (VALIDATION_ERROR)", body = ErrorBody),
        (status = 500, description = "File storage failed (STORAGE_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, form))]
pub async fn update_record(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, i32)>,
    ResourceForm(form): ResourceForm,
) -> Result<Json<ApiResponse<RecordResponse>>, AppError> {
    let lifecycle = state.lifecycle(&resource)?;
    let schema = lifecycle.schema();
    auth_user.require_permission(&schema.scope.write())?;

    let record = lifecycle.update(id, form, auth_user.actor()).await?;
    Ok(Json(ApiResponse::ok(
        format!("{} updated successfully", schema.label),
        RecordResponse::from_record(schema, record),
    )))
}

#[utoipa::path(
    delete,
    path = "/{resource}/{id}",
    tag = "Resources",
    operation_id = "trashResource",
    summary = "Move a record to the trash",
    description = "Soft delete: the record leaves the active listing and appears in the trash. \
        Its files are kept. Requires `{scope}:write`.",
    params(
        ("resource" = String, Path, description = "Resource collection, e.g. `articles`"),
        ("id" = i32, Path, description = "Record ID"),
    ),
    responses(
        (status = 200, description = "Record trashed", body = ApiResponse<DeletedResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found or already trashed (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn trash_record(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, i32)>,
) -> Result<Json<ApiResponse<DeletedResponse>>, AppError> {
    let lifecycle = state.lifecycle(&resource)?;
    let schema = lifecycle.schema();
    auth_user.require_permission(&schema.scope.write())?;

    lifecycle.soft_delete(id).await?;
    Ok(Json(ApiResponse::ok(
        format!("{} moved to trash", schema.label),
        DeletedResponse { id },
    )))
}

#[utoipa::path(
    post,
    path = "/{resource}/{id}/restore",
    tag = "Resources",
    operation_id = "restoreResource",
    summary = "Restore a trashed record",
    description = "Fails with VALIDATION_ERROR if an active record now holds one of the record's \
        unique values. Requires `{scope}:write`.",
    params(
        ("resource" = String, Path, description = "Resource collection, e.g. `articles`"),
        ("id" = i32, Path, description = "Record ID"),
    ),
    responses(
        (status = 200, description = "Record restored", body = ApiResponse<RecordResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not in the trash (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Unique value taken (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn restore_record(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, i32)>,
) -> Result<Json<ApiResponse<RecordResponse>>, AppError> {
    let lifecycle = state.lifecycle(&resource)?;
    let schema = lifecycle.schema();
    auth_user.require_permission(&schema.scope.write())?;

    let record = lifecycle.restore(id).await?;
    Ok(Json(ApiResponse::ok(
        format!("{} restored successfully", schema.label),
        RecordResponse::from_record(schema, record),
    )))
}

#[utoipa::path(
    post,
    path = "/{resource}/trash/restore",
    tag = "Resources",
    operation_id = "restoreAllResources",
    summary = "Restore every trashed record",
    description = "Records whose unique values are now held by an active record stay in the \
        trash. Returns how many were restored, possibly zero. Requires `{scope}:purge`.",
    params(("resource" = String, Path, description = "Resource collection, e.g. `articles`")),
    responses(
        (status = 200, description = "Trash restored", body = ApiResponse<RestoreAllResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown resource (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn restore_all_records(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(resource): Path<String>,
) -> Result<Json<ApiResponse<RestoreAllResponse>>, AppError> {
    let lifecycle = state.lifecycle(&resource)?;
    let schema = lifecycle.schema();
    auth_user.require_permission(&schema.scope.purge())?;

    let restored = lifecycle.restore_all().await?;
    Ok(Json(ApiResponse::ok(
        format!("{restored} {} record(s) restored", schema.label.to_lowercase()),
        RestoreAllResponse { restored },
    )))
}

#[utoipa::path(
    delete,
    path = "/{resource}/{id}/purge",
    tag = "Resources",
    operation_id = "purgeResource",
    summary = "Permanently delete a trashed record",
    description = "Removes every stored image and thumbnail of the record, then the record. If a \
        file cannot be removed the record stays in the trash and STORAGE_ERROR is returned. \
        Active records must be trashed first. Requires `{scope}:purge`.",
    params(
        ("resource" = String, Path, description = "Resource collection, e.g. `articles`"),
        ("id" = i32, Path, description = "Record ID"),
    ),
    responses(
        (status = 200, description = "Record purged", body = ApiResponse<DeletedResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not in the trash (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "File removal failed (STORAGE_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn purge_record(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, i32)>,
) -> Result<Json<ApiResponse<DeletedResponse>>, AppError> {
    let lifecycle = state.lifecycle(&resource)?;
    let schema = lifecycle.schema();
    auth_user.require_permission(&schema.scope.purge())?;

    lifecycle.purge(id).await?;
    Ok(Json(ApiResponse::ok(
        format!("{} permanently deleted", schema.label),
        DeletedResponse { id },
    )))
}
