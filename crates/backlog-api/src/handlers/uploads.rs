//! Image upload handlers
//!
//! The multipart field `file` is sniffed, size-checked and written through the shared
//! [`SecureUploader`](backlog_storage::SecureUploader). The client file name is only logged.

use std::sync::Arc;

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use backlog_core::validation::FieldViolation;
use backlog_storage::UploadOutcome;
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::ApiTokenGuard;
use crate::error::{upload_rejection, HttpAppError, ValidatedPath};
use crate::handlers::items::item_not_found;
use crate::state::AppState;

const FILE_FIELD: &str = "file";

/// Multipart form accepted by the upload endpoints
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    /// PNG or JPEG image
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    /// Canonical path of the stored file
    pub path: String,
    pub media_type: String,
    pub size_bytes: usize,
}

fn multipart_error(err: MultipartError) -> HttpAppError {
    HttpAppError::protocol(err.status(), Some(err.body_text()))
}

/// Pull the `file` field out of the form as `(client file name, bytes)`.
async fn read_file_field(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(String, Vec<u8>), HttpAppError> {
    let mut multipart = multipart
        .map_err(|rejection| HttpAppError::protocol(rejection.status(), Some(rejection.body_text())))?;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename_hint = field.file_name().unwrap_or("upload").to_string();
        let data = field.bytes().await.map_err(multipart_error)?;
        return Ok((filename_hint, data.to_vec()));
    }

    Err(HttpAppError::validation(vec![FieldViolation::new(
        "missing",
        vec!["body".to_string(), FILE_FIELD.to_string()],
        "Field required",
    )]))
}

fn accepted(outcome: UploadOutcome, size_bytes: usize) -> Result<impl IntoResponse, HttpAppError> {
    match outcome {
        UploadOutcome::Accepted {
            stored_path,
            media_type,
        } => Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                path: stored_path.to_string_lossy().into_owned(),
                media_type: media_type.media_type().unwrap_or_default().to_string(),
                size_bytes,
            }),
        )),
        UploadOutcome::Rejected(reason) => Err(upload_rejection(reason).into()),
    }
}

/// Upload an image
#[utoipa::path(
    post,
    path = "/uploads",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Image stored", body = UploadResponse),
        (status = 401, description = "Missing or invalid API token"),
        (status = 409, description = "Destination collision"),
        (status = 413, description = "Image too large"),
        (status = 415, description = "Not a PNG or JPEG image"),
        (status = 422, description = "Missing file field")
    ),
    security(("api_key" = [])),
    tag = "uploads"
)]
#[tracing::instrument(skip(state, _guard, multipart))]
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    _guard: ApiTokenGuard,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, HttpAppError> {
    let (filename_hint, data) = read_file_field(multipart).await?;
    let outcome = state.uploads.persist(&filename_hint, &data).await?;
    accepted(outcome, data.len())
}

/// Upload an image for an item, stored under the item's own directory
#[utoipa::path(
    post,
    path = "/items/{id}/images",
    params(("id" = i64, Path, description = "Item id")),
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Image stored", body = UploadResponse),
        (status = 401, description = "Missing or invalid API token"),
        (status = 404, description = "Item not found"),
        (status = 413, description = "Image too large"),
        (status = 415, description = "Not a PNG or JPEG image")
    ),
    security(("api_key" = [])),
    tag = "uploads"
)]
#[tracing::instrument(skip(state, _guard, multipart))]
pub async fn upload_item_image(
    State(state): State<Arc<AppState>>,
    _guard: ApiTokenGuard,
    ValidatedPath(id): ValidatedPath<i64>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.db.items.get(id).await?.ok_or_else(item_not_found)?;

    let (filename_hint, data) = read_file_field(multipart).await?;
    let partition = id.to_string();
    let outcome = state
        .uploads
        .persist_in(Some(&partition), &filename_hint, &data)
        .await?;
    accepted(outcome, data.len())
}
