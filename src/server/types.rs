//! JSON request and response bodies of the HTTP surface.

use crate::models::{AssetRecord, DeleteOutcome};
use serde::{Deserialize, Serialize};

/// Body of DELETE and PUT requests.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
}

impl IdRequest {
    /// Parse a request body; anything unparseable counts as an empty request.
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }

    /// The id, if present and not blank.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub url: Option<String>,
    pub thumbnail: Option<String>,
    pub name: String,
    pub mime_type: String,
    pub cloudinary_id: Option<String>,
    pub resource_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub id: String,
    pub name: String,
    pub url: Option<String>,
    pub thumbnail: Option<String>,
    pub size: u64,
    #[serde(rename = "type")]
    pub delivery_type: String,
    pub mime_type: String,
    pub uploaded_at: String,
}

impl FileEntry {
    /// Project a listed asset; zero-byte or size-less assets are not shown.
    pub fn from_record(record: &AssetRecord, now: &str) -> Option<Self> {
        let size = record.bytes.filter(|&b| b > 0)?;
        let is_image = record.resource_type.as_deref() == Some("image");

        Some(Self {
            id: record.public_id.clone(),
            name: record.display_name().to_string(),
            url: record.secure_url.clone(),
            thumbnail: if is_image {
                record.secure_url.clone()
            } else {
                None
            },
            size,
            delivery_type: record
                .delivery_type
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            mime_type: record
                .resource_type
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            uploaded_at: record.created_at.clone().unwrap_or_else(|| now.to_string()),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub success: bool,
    pub message: String,
    pub files: Vec<FileEntry>,
    pub total: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_types: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResult {
    pub result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<&DeleteOutcome> for DeleteResult {
    fn from(outcome: &DeleteOutcome) -> Self {
        Self {
            result: outcome.as_result_str().to_string(),
            message: match outcome {
                DeleteOutcome::NotFound => Some("File not found in Cloudinary".to_string()),
                _ => None,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<DeleteResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
