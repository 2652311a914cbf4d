use axum::Json;
use axum::extract::{Path, State};
use serde_json::{Map, Value};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::lifecycle::ResourceInput;
use crate::models::resource::RecordResponse;
use crate::models::shared::ApiResponse;
use crate::schema::SETTING;
use crate::state::AppState;

/// Fields an update may change. Keys are fixed by seeding.
const EDITABLE_FIELDS: &[&str] = &["label", "value"];

#[utoipa::path(
    get,
    path = "/settings",
    tag = "Settings",
    operation_id = "listSettings",
    summary = "List every site setting",
    description = "All settings ordered by key, without pagination. Requires `settings:read`.",
    responses(
        (status = 200, description = "Settings", body = ApiResponse<Vec<RecordResponse>>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn list_settings(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<RecordResponse>>>, AppError> {
    auth_user.require_permission(&SETTING.scope.read())?;

    let records = state.lifecycle_for(&SETTING).list_all("key").await?;
    let items = records
        .into_iter()
        .map(|record| RecordResponse::from_record(&SETTING, record))
        .collect();
    Ok(Json(ApiResponse::ok("Settings retrieved successfully", items)))
}

#[utoipa::path(
    put,
    path = "/settings/{id}",
    tag = "Settings",
    operation_id = "updateSetting",
    summary = "Update one setting",
    description = "Only `value` and `label` are accepted; the key cannot change. Requires \
        `settings:write`.",
    params(("id" = i32, Path, description = "Setting ID")),
    request_body(content = Object, description = "`value` and/or `label`", content_type = "application/json"),
    responses(
        (status = 200, description = "Setting updated", body = ApiResponse<RecordResponse>),
        (status = 400, description = "Unreadable body (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown setting (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation failed (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, fields))]
pub async fn update_setting(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(mut fields): AppJson<Map<String, Value>>,
) -> Result<Json<ApiResponse<RecordResponse>>, AppError> {
    auth_user.require_permission(&SETTING.scope.write())?;

    fields.retain(|name, _| EDITABLE_FIELDS.contains(&name.as_str()));
    let input = ResourceInput {
        fields,
        ..Default::default()
    };
    let record = state
        .lifecycle_for(&SETTING)
        .update(id, input, auth_user.actor())
        .await?;
    Ok(Json(ApiResponse::ok(
        "Setting updated successfully",
        RecordResponse::from_record(&SETTING, record),
    )))
}
