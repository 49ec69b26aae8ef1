//! Handlers for the four verbs served on `/`.

use super::types::{
    DeleteResponse, DeleteResult, FileEntry, IdRequest, ListResponse, MessageResponse,
    UploadResponse,
};
use super::AppState;
use crate::mime::guess_mime_from_name;
use crate::models::ResourceType;
use crate::{Error, Result};
use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{error, info, warn};

fn json<T: Serialize>(status: StatusCode, body: T) -> Response {
    (status, Json(body)).into_response()
}

/// The `file` part of an upload form.
struct IncomingFile {
    name: String,
    content_type: Option<String>,
    data: Bytes,
}

impl IncomingFile {
    fn mime_type(&self) -> String {
        self.content_type
            .clone()
            .filter(|ct| !ct.is_empty())
            .or_else(|| guess_mime_from_name(&self.name).map(str::to_string))
            .unwrap_or_else(|| "application/octet-stream".to_string())
    }
}

async fn read_file_field(multipart: &mut Multipart) -> Option<IncomingFile> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read multipart field: {}", e);
                return None;
            }
        };

        if field.name() != Some("file") {
            continue;
        }

        // A `file` part without a filename is not an upload; keep looking.
        let Some(name) = field
            .file_name()
            .and_then(|n| Path::new(n).file_name())
            .map(|n| n.to_string_lossy().into_owned())
        else {
            continue;
        };
        let content_type = field.content_type().map(str::to_string);

        return match field.bytes().await {
            Ok(data) => Some(IncomingFile {
                name,
                content_type,
                data,
            }),
            Err(e) => {
                warn!("Failed to read upload data: {}", e);
                None
            }
        };
    }
}

/// Write the upload to a temp file that keeps the original extension.
async fn spool_to_temp(file: &IncomingFile) -> Result<NamedTempFile> {
    let suffix = Path::new(&file.name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    let temp = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(&suffix)
        .tempfile()?;
    tokio::fs::write(temp.path(), &file.data).await?;
    Ok(temp)
}

/// POST /
///
/// Content-Type: multipart/form-data, field `file`.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Response {
    let file = match multipart {
        Ok(mut multipart) => read_file_field(&mut multipart).await,
        Err(e) => {
            warn!("Rejected upload body: {}", e);
            None
        }
    };

    let Some(file) = file else {
        return json(
            StatusCode::BAD_REQUEST,
            MessageResponse::failure("No file uploaded or upload error occurred"),
        );
    };

    let mime_type = file.mime_type();
    info!(
        "Upload received: {} ({}, {} bytes)",
        file.name,
        mime_type,
        file.data.len()
    );

    // The spooled copy is removed when `temp` drops after the upload.
    let result = match spool_to_temp(&file).await {
        Ok(temp) => {
            state
                .coordinator
                .upload(temp.path(), &state.upload_folder)
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(summary) => {
            let thumbnail = mime_type
                .starts_with("image/")
                .then(|| summary.url.clone());
            json(
                StatusCode::OK,
                UploadResponse {
                    success: true,
                    message: "File uploaded successfully".to_string(),
                    url: Some(summary.url),
                    thumbnail,
                    name: file.name,
                    mime_type,
                    cloudinary_id: Some(summary.public_id),
                    resource_type: summary.resource_type,
                },
            )
        }
        Err(e) => {
            error!("Upload of {} failed: {}", file.name, e);
            let message = match e {
                Error::UploadError(_) => e.to_string(),
                other => format!("Upload error: {}", other),
            };
            json(
                StatusCode::INTERNAL_SERVER_ERROR,
                MessageResponse::failure(message),
            )
        }
    }
}

/// GET /
pub async fn list_files(State(state): State<Arc<AppState>>) -> Response {
    match state.coordinator.list_files().await {
        Ok(listing) => {
            let now = chrono::Utc::now().to_rfc3339();
            let files: Vec<FileEntry> = listing
                .assets
                .iter()
                .filter_map(|record| FileEntry::from_record(record, &now))
                .collect();

            info!(
                "Listed {} files ({} skipped types)",
                files.len(),
                listing.skipped.len()
            );

            json(
                StatusCode::OK,
                ListResponse {
                    success: true,
                    message: "Files retrieved successfully".to_string(),
                    total: files.len(),
                    files,
                    skipped_types: listing.skipped.iter().map(ToString::to_string).collect(),
                },
            )
        }
        Err(e) => {
            error!("Listing files failed: {}", e);
            json(
                StatusCode::INTERNAL_SERVER_ERROR,
                MessageResponse::failure(format!("Error retrieving files: {}", e)),
            )
        }
    }
}

/// DELETE /
///
/// Body: `{"id": "<public id>", "resourceType": "image|video|raw"?}`. Answers
/// 200 for every vendor-side result so repeated deletes stay harmless.
pub async fn delete_file(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let request = IdRequest::from_body(&body);
    let Some(id) = request.id() else {
        return json(
            StatusCode::BAD_REQUEST,
            MessageResponse::failure("File ID is required"),
        );
    };

    let resource_type = match request
        .resource_type
        .as_deref()
        .map(str::parse::<ResourceType>)
        .transpose()
    {
        Ok(resource_type) => resource_type,
        Err(e) => {
            return json(
                StatusCode::BAD_REQUEST,
                MessageResponse::failure(e.to_string()),
            )
        }
    };

    match state.coordinator.delete(id, resource_type).await {
        Ok(outcome) => {
            let message = if outcome.is_success() {
                "File deleted successfully"
            } else {
                "File delete completed"
            };
            json(
                StatusCode::OK,
                DeleteResponse {
                    success: true,
                    message: message.to_string(),
                    result: Some(DeleteResult::from(&outcome)),
                    error: None,
                },
            )
        }
        Err(e @ Error::Validation(_)) => json(
            StatusCode::BAD_REQUEST,
            MessageResponse::failure(e.to_string()),
        ),
        Err(e @ (Error::DeleteFailed(_) | Error::Upstream(_) | Error::Http(_))) => {
            warn!("Delete of {} did not complete: {}", id, e);
            json(
                StatusCode::OK,
                DeleteResponse {
                    success: true,
                    message: "Delete processed".to_string(),
                    result: None,
                    error: Some(e.to_string()),
                },
            )
        }
        Err(e) => {
            error!("Delete of {} failed unexpectedly: {}", id, e);
            json(
                StatusCode::INTERNAL_SERVER_ERROR,
                MessageResponse::failure(format!("Server error: {}", e)),
            )
        }
    }
}

/// PUT /
///
/// Metadata updates are not supported yet; this only confirms the local file exists.
pub async fn update_metadata(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let request = IdRequest::from_body(&body);
    let Some(id) = request.id() else {
        return json(
            StatusCode::BAD_REQUEST,
            MessageResponse::failure("File ID is required"),
        );
    };

    match state.coordinator.check_metadata_target(id).await {
        Ok(_) => json(
            StatusCode::OK,
            MessageResponse::ok("File metadata updated successfully"),
        ),
        Err(e @ Error::NotFound(_)) => json(
            StatusCode::NOT_FOUND,
            MessageResponse::failure(e.to_string()),
        ),
        Err(e) => {
            error!("Metadata check for {} failed: {}", id, e);
            json(
                StatusCode::INTERNAL_SERVER_ERROR,
                MessageResponse::failure(format!("Server error: {}", e)),
            )
        }
    }
}

/// OPTIONS, answered with an empty 200.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed() -> Response {
    json(
        StatusCode::METHOD_NOT_ALLOWED,
        MessageResponse::failure("Method not allowed"),
    )
}

/// Anything outside `/`: preflights still succeed, everything else is unknown.
pub async fn unknown_route(method: Method) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    json(StatusCode::NOT_FOUND, MessageResponse::failure("Not found"))
}
