//! Image upload endpoints and the static `/uploads/{fileName}` route.
//! Bodies are streamed in both directions; `UploadService` owns the disk.

use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use std::io;
use tokio_util::io::ReaderStream;

use crate::{
    auth::AdminUser,
    errors::AppError,
    extractors::AppJson,
    handlers::Deleted,
    services::{store::non_blank, upload_service::UploadError},
    state::AppState,
};

/// Name of the multipart field carrying the file.
const FILE_FIELD: &str = "file";

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub url: String,
    pub file_name: String,
    pub size: u64,
    pub etag: String,
}

#[derive(Deserialize, Default, Debug)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct DeleteImageRequest {
    pub file_name: Option<String>,
}

/// `POST /api/upload-image` (multipart, field `file`).
pub async fn upload_image(
    _admin: AdminUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        let stream = field.map_err(io::Error::other);
        let stored = state
            .uploads
            .store_stream(&original_name, stream)
            .await
            .map_err(upload_error)?;

        tracing::info!(
            stored_name = %stored.stored_name,
            size_bytes = stored.size_bytes,
            "uploaded image"
        );
        return Ok(Json(UploadResponse {
            success: true,
            url: stored.url,
            file_name: stored.stored_name,
            size: stored.size_bytes,
            etag: stored.etag,
        }));
    }

    Err(AppError::bad_request("No file uploaded"))
}

/// `DELETE /api/upload-image { fileName }`. Deleting a missing file succeeds.
pub async fn delete_image(
    _admin: AdminUser,
    State(state): State<AppState>,
    AppJson(body): AppJson<DeleteImageRequest>,
) -> Result<Json<Deleted>, AppError> {
    let file_name =
        non_blank(body.file_name).ok_or_else(|| AppError::bad_request("No file name provided"))?;
    state.uploads.remove(&file_name).await?;
    tracing::info!(file_name = %file_name, "deleted image");
    Ok(Json(Deleted::new("File deleted")))
}

/// `GET /uploads/{fileName}`: stream a stored file back.
pub async fn serve_upload(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Result<Response, AppError> {
    let (file, len) = state.uploads.open(&file_name).await.map_err(|err| match err {
        // A bad name can never exist on disk.
        UploadError::InvalidName(_) => AppError::not_found("File not found"),
        other => other.into(),
    })?;

    let mime = mime_guess::from_path(&file_name).first_or_octet_stream();
    let mut response = Body::from_stream(ReaderStream::new(file)).into_response();
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    Ok(response)
}

fn multipart_error(err: MultipartError) -> AppError {
    AppError::new(err.status(), err.body_text())
}

/// A failed body stream arrives wrapped in `io::Error`; surface the
/// multipart status (e.g. 413 for an oversized body) instead of a 500.
fn upload_error(err: UploadError) -> AppError {
    if let UploadError::Io(io_err) = &err {
        if let Some(multipart) = io_err
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<MultipartError>())
        {
            return AppError::new(multipart.status(), multipart.body_text());
        }
    }
    err.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn plain_io_failures_stay_internal() {
        let err = upload_error(UploadError::Io(io::Error::other("disk full")));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);

        let empty = upload_error(UploadError::EmptyFile);
        assert_eq!(empty.status, StatusCode::BAD_REQUEST);
    }
}
