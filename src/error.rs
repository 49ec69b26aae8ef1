//! Error handling and custom error types
//!
//! Provides unified error handling across the gateway using thiserror.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// A required request field was missing or empty.
    #[error("{0}")]
    Validation(String),

    /// A local file targeted by the request does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The vendor call failed or returned an unexpected shape.
    #[error("Cloudinary error: {0}")]
    Upstream(String),

    #[error("Cloudinary upload failed: {0}")]
    UploadFailed(String),

    #[error("Temporary file not found: {}", .0.display())]
    TempFileMissing(PathBuf),

    /// Coordinator-level wrapper around any upload failure.
    #[error("Upload error: {0}")]
    UploadError(String),

    #[error("Cloudinary delete failed: {0}")]
    DeleteFailed(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_error_preserves_message() {
        let inner = Error::UploadFailed("no secure_url in response".to_string());
        let wrapped = Error::UploadError(inner.to_string());
        assert_eq!(
            wrapped.to_string(),
            "Upload error: Cloudinary upload failed: no secure_url in response"
        );
    }
}
