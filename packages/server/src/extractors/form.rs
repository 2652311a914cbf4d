use std::collections::BTreeMap;

use axum::extract::multipart::MultipartError;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::{StatusCode, header};
use serde_json::{Map, Value};

use super::json::AppJson;
use crate::error::AppError;
use crate::lifecycle::ResourceInput;
use crate::media::Upload;

/// Create/update payload, accepted as `application/json` or
/// `multipart/form-data`.
///
/// In a multipart body, parts carrying a filename are uploads keyed by part
/// name (the media slot); every other part is a text field.
pub struct ResourceForm(pub ResourceInput);

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::BadRequest(format!("Multipart error: {}", err.body_text()))
    }
}

impl<S> FromRequest<S> for ResourceForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_multipart(&req) {
            let AppJson(fields) = AppJson::<Map<String, Value>>::from_request(req, state).await?;
            return Ok(ResourceForm(ResourceInput {
                fields,
                uploads: BTreeMap::new(),
            }));
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        let mut input = ResourceInput::default();
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await.map_err(multipart_error)?;
                    // A file input submitted without a file.
                    if file_name.is_empty() && bytes.is_empty() {
                        continue;
                    }
                    input.uploads.insert(
                        name,
                        Upload {
                            file_name,
                            content_type,
                            bytes,
                        },
                    );
                }
                None => {
                    let text = field.text().await.map_err(multipart_error)?;
                    input.fields.insert(name, Value::String(text));
                }
            }
        }

        Ok(ResourceForm(input))
    }
}
