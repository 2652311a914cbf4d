use axum::Json;
use axum::extract::State;
use serde_json::Value;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::form::ResourceForm;
use crate::extractors::json::AppJson;
use crate::lifecycle::ResourceInput;
use crate::models::profile::ChangePasswordRequest;
use crate::models::resource::RecordResponse;
use crate::models::shared::ApiResponse;
use crate::schema::USER;
use crate::state::AppState;
use crate::utils::hash;
use crate::validation::FieldErrors;

/// Fields a user may change on their own profile.
const PROFILE_FIELDS: &[&str] = &["name", "email"];
const PROFILE_UPLOADS: &[&str] = &["avatar"];

#[utoipa::path(
    get,
    path = "/profile",
    tag = "Profile",
    operation_id = "getProfile",
    summary = "Get the current user's profile",
    responses(
        (status = 200, description = "Profile", body = ApiResponse<RecordResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Account no longer active (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_profile(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<RecordResponse>>, AppError> {
    let record = state.lifecycle_for(&USER).get(auth_user.user_id).await?;
    Ok(Json(ApiResponse::ok(
        "Profile retrieved successfully",
        RecordResponse::from_record(&USER, record),
    )))
}

#[utoipa::path(
    put,
    path = "/profile",
    tag = "Profile",
    operation_id = "updateProfile",
    summary = "Update the current user's profile",
    description = "Only `name`, `email` and an `avatar` upload are accepted; anything else is \
        ignored. Accepts `application/json` or `multipart/form-data`.",
    request_body(content = Object, description = "`name`, `email`; multipart `avatar` part", content_type = "application/json"),
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<RecordResponse>),
        (status = 400, description = "Unreadable body (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Account no longer active (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation failed (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, form), fields(user_id = auth_user.user_id))]
pub async fn update_profile(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ResourceForm(form): ResourceForm,
) -> Result<Json<ApiResponse<RecordResponse>>, AppError> {
    let ResourceInput {
        mut fields,
        mut uploads,
    } = form;
    fields.retain(|name, _| PROFILE_FIELDS.contains(&name.as_str()));
    uploads.retain(|name, _| PROFILE_UPLOADS.contains(&name.as_str()));

    let record = state
        .lifecycle_for(&USER)
        .update(
            auth_user.user_id,
            ResourceInput { fields, uploads },
            auth_user.actor(),
        )
        .await?;
    Ok(Json(ApiResponse::ok(
        "Profile updated successfully",
        RecordResponse::from_record(&USER, record),
    )))
}

#[utoipa::path(
    put,
    path = "/profile/password",
    tag = "Profile",
    operation_id = "changePassword",
    summary = "Change the current user's password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = ApiResponse<RecordResponse>),
        (status = 400, description = "Unreadable body (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Account no longer active (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Wrong current password, weak or unconfirmed new one (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn change_password(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<RecordResponse>>, AppError> {
    let users = state.lifecycle_for(&USER);
    let current = users.get(auth_user.user_id).await?;

    let stored = current
        .fields
        .get("password")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let is_valid = hash::verify_password(&payload.current_password, stored)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;
    if !is_valid {
        return Err(AppError::Validation(FieldErrors::single(
            "current_password",
            "The current password is incorrect.",
        )));
    }

    // A blank password would otherwise read as "keep the current one".
    if payload.password.is_empty() {
        return Err(AppError::Validation(FieldErrors::single(
            "password",
            "The password field is required.",
        )));
    }

    if payload.password != payload.password_confirmation {
        return Err(AppError::Validation(FieldErrors::single(
            "password",
            "The password field confirmation does not match.",
        )));
    }

    let mut input = ResourceInput::default();
    input
        .fields
        .insert("password".into(), Value::String(payload.password));
    let record = users
        .update(auth_user.user_id, input, auth_user.actor())
        .await?;
    Ok(Json(ApiResponse::ok(
        "Password changed successfully",
        RecordResponse::from_record(&USER, record),
    )))
}
