//! File handlers for Web API.

use axum::{
    body::Body,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, Path, State,
    },
    http::{header, StatusCode},
    response::Response,
    Json,
};
use bytes::Bytes;
use std::sync::Arc;

use crate::file::{FileRecord, OpenMode, OpenedFile, UploadRequest};
use crate::web::dto::{FileResponse, FileWithOwnerResponse, MessageResponse};
use crate::web::error::{ApiError, ErrorBody};
use crate::web::handlers::AppState;
use crate::web::middleware::{AuthUser, ViewAuthUser};

const NO_FILE_MESSAGE: &str = "Please upload a file";
const TOO_LARGE_MESSAGE: &str = "File too large. Maximum size is 5MB";

/// Generate a safe Content-Disposition header value.
///
/// Control characters are removed so a file name cannot inject headers;
/// quotes and backslashes are replaced in the plain `filename` parameter and
/// non-ASCII names get an RFC 5987 `filename*` parameter.
fn content_disposition_header(disposition: &str, filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            _ => c,
        })
        .collect();

    if filename.is_ascii() && sanitized == filename {
        return format!("{disposition}; filename=\"{filename}\"");
    }

    let encoded = urlencoding::encode(filename);
    format!("{disposition}; filename=\"{sanitized}\"; filename*=UTF-8''{encoded}")
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::bad_request(TOO_LARGE_MESSAGE)
    } else {
        tracing::debug!(error = %e, "failed to read multipart body");
        ApiError::bad_request(NO_FILE_MESSAGE)
    }
}

/// Pull the `file` field out of a multipart body.
async fn read_file_field(mut multipart: Multipart) -> Result<UploadRequest, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let content: Bytes = field.bytes().await.map_err(multipart_error)?;
        return Ok(UploadRequest::new(file_name, content_type, content));
    }
    Err(ApiError::bad_request(NO_FILE_MESSAGE))
}

fn stream_response(opened: OpenedFile, mode: OpenMode) -> Result<Response, ApiError> {
    let OpenedFile { record, stream } = opened;
    let disposition = match mode {
        OpenMode::View => "inline",
        OpenMode::Download => "attachment",
    };

    let mut builder = Response::builder()
        .header(header::CONTENT_TYPE, &record.content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(disposition, &record.file_name),
        )
        .header(header::CONTENT_LENGTH, record.size);

    if mode == OpenMode::View {
        builder = builder
            .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
            .header("Cross-Origin-Resource-Policy", "cross-origin");
    }

    builder.body(Body::from_stream(stream)).map_err(|e| {
        tracing::error!(file_id = record.id, error = %e, "failed to build response");
        ApiError::internal(crate::web::error::INTERNAL_ERROR_MESSAGE)
    })
}

/// POST /api/files - Upload a file.
#[utoipa::path(
    post,
    path = "/api/files",
    tag = "files",
    request_body(content = String, description = "Multipart form with a `file` field", content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File uploaded", body = FileResponse),
        (status = 400, description = "No file, file too large or type not allowed", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 500, description = "Storage provider failure", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<FileResponse>), ApiError> {
    let multipart = multipart.map_err(|e| {
        tracing::debug!(error = %e, "upload without multipart body");
        ApiError::bad_request(NO_FILE_MESSAGE)
    })?;
    let request = read_file_field(multipart).await?;

    let record = state
        .files()
        .upload(&auth.caller(), request)
        .await
        .map_err(|e| ApiError::upstream_context(e, "Failed to upload file to storage"))?;

    Ok((StatusCode::CREATED, Json(record.into())))
}

/// GET /api/files/myfiles - The caller's files, newest first.
#[utoipa::path(
    get,
    path = "/api/files/myfiles",
    tag = "files",
    responses(
        (status = 200, description = "Own files", body = Vec<FileResponse>),
        (status = 401, description = "Unauthorized", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn my_files(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<FileResponse>>, ApiError> {
    let files = state.files().list_own(&auth.caller()).await?;
    Ok(Json(files.into_iter().map(FileRecord::into).collect()))
}

/// GET /api/files/all - Every file with its owner. Administrators only.
#[utoipa::path(
    get,
    path = "/api/files/all",
    tag = "files",
    responses(
        (status = 200, description = "All files", body = Vec<FileWithOwnerResponse>),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Not an administrator", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn all_files(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<FileWithOwnerResponse>>, ApiError> {
    let files = state.files().list_all(&auth.caller()).await?;
    Ok(Json(files.into_iter().map(Into::into).collect()))
}

/// GET /api/files/view/:id - Stream a file for inline display.
///
/// Also accepts the token as `?token=` for `<img>` and `<video>` sources.
#[utoipa::path(
    get,
    path = "/api/files/view/{id}",
    tag = "files",
    params(
        ("id" = i64, Path, description = "File ID"),
        ("token" = Option<String>, Query, description = "Session token, when no header can be sent")
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "File not found", body = ErrorBody),
        (status = 500, description = "Storage provider failure", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn view_file(
    State(state): State<Arc<AppState>>,
    auth: ViewAuthUser,
    Path(file_id): Path<i64>,
) -> Result<Response, ApiError> {
    let opened = state
        .files()
        .open(&auth.caller(), file_id, OpenMode::View)
        .await
        .map_err(|e| ApiError::upstream_context(e, "Failed to view file from storage"))?;
    stream_response(opened, OpenMode::View)
}

/// GET /api/files/download/:id - Stream a file as an attachment.
#[utoipa::path(
    get,
    path = "/api/files/download/{id}",
    tag = "files",
    params(
        ("id" = i64, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "File not found", body = ErrorBody),
        (status = 500, description = "Storage provider failure", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(file_id): Path<i64>,
) -> Result<Response, ApiError> {
    let opened = state
        .files()
        .open(&auth.caller(), file_id, OpenMode::Download)
        .await
        .map_err(|e| ApiError::upstream_context(e, "Failed to download file from storage"))?;
    stream_response(opened, OpenMode::Download)
}

/// DELETE /api/files/:id - Delete a file and its blob.
#[utoipa::path(
    delete,
    path = "/api/files/{id}",
    tag = "files",
    params(
        ("id" = i64, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "File not found", body = ErrorBody),
        (status = 500, description = "Storage provider failure; the record is kept", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(file_id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .files()
        .delete(&auth.caller(), file_id)
        .await
        .map_err(|e| ApiError::upstream_context(e, "Failed to delete file from storage"))?;
    Ok(Json(MessageResponse::new("File deleted successfully")))
}
