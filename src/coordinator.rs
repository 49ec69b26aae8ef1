//! Upload coordination between the HTTP layer and the asset client.

use crate::assets::{catalog, AssetService, CloudinaryClient, MockAssetClient};
use crate::models::{Config, DeleteOutcome, Listing, ResourceType};
use crate::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

const VENDOR_TIMEOUT: Duration = Duration::from_secs(60);

/// Projection of a successful upload handed back to the dispatcher.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UploadSummary {
    pub success: bool,
    pub url: String,
    pub public_id: String,
    pub size: Option<u64>,
    #[serde(rename = "type")]
    pub delivery_type: Option<String>,
    pub resource_type: Option<String>,
}

/// Validates inputs and fronts every asset operation the dispatcher needs.
pub struct UploadCoordinator {
    assets: Box<dyn AssetService>,
    delete_order: Vec<ResourceType>,
    uploads_dir: PathBuf,
}

impl UploadCoordinator {
    pub fn new(
        assets: Box<dyn AssetService>,
        delete_order: Vec<ResourceType>,
        uploads_dir: PathBuf,
    ) -> Self {
        Self {
            assets,
            delete_order,
            uploads_dir,
        }
    }

    /// Construct a coordinator from environment configuration (`Config::from_env`).
    pub fn from_config(config: &Config) -> Result<Self> {
        let assets: Box<dyn AssetService> = if config.dry_run {
            info!("DRY_RUN enabled, assets are kept in memory");
            Box::new(MockAssetClient::new())
        } else {
            let credentials = config.credentials.clone().ok_or_else(|| {
                Error::Config(
                    "Cloudinary credentials are required unless DRY_RUN is set".to_string(),
                )
            })?;
            info!(
                "Using Cloudinary cloud '{}' ({} signatures)",
                credentials.cloud_name,
                config.signature_algorithm.as_str()
            );
            Box::new(
                CloudinaryClient::new(credentials, VENDOR_TIMEOUT)?
                    .with_base_url(config.api_base.clone())
                    .with_signature_algorithm(config.signature_algorithm),
            )
        };

        Ok(Self::new(
            assets,
            config.delete_order.clone(),
            config.uploads_dir.clone(),
        ))
    }

    /// Upload a local temp file into `folder`.
    pub async fn upload(&self, temp_path: &Path, folder: &str) -> Result<UploadSummary> {
        if !tokio::fs::try_exists(temp_path).await.unwrap_or(false) {
            return Err(Error::TempFileMissing(temp_path.to_path_buf()));
        }

        let result = self.assets.upload(temp_path, folder).await.map_err(|e| {
            error!("Upload to folder {} failed: {}", folder, e);
            Error::UploadError(e.to_string())
        })?;

        let url = result.secure_url.ok_or_else(|| {
            Error::UploadError("Invalid upload response from Cloudinary".to_string())
        })?;

        info!("Uploaded {} ({:?} bytes)", result.public_id, result.bytes);

        Ok(UploadSummary {
            success: true,
            url,
            public_id: result.public_id,
            size: result.bytes,
            delivery_type: result.delivery_type,
            resource_type: result.resource_type,
        })
    }

    pub async fn list_files(&self) -> Result<Listing> {
        catalog::list_all(self.assets.as_ref(), &ResourceType::ALL).await
    }

    /// Delete by public id, sweeping namespaces unless `resource_type` pins one.
    pub async fn delete(
        &self,
        public_id: &str,
        resource_type: Option<ResourceType>,
    ) -> Result<DeleteOutcome> {
        let public_id = public_id.trim();
        if public_id.is_empty() {
            return Err(Error::Validation(
                "Public ID is required for delete".to_string(),
            ));
        }

        match resource_type {
            Some(resource_type) => {
                catalog::delete_in(self.assets.as_ref(), public_id, resource_type).await
            }
            None => catalog::delete(self.assets.as_ref(), public_id, &self.delete_order).await,
        }
    }

    /// Existence check behind the metadata endpoint; nothing is modified.
    pub async fn check_metadata_target(&self, id: &str) -> Result<PathBuf> {
        let file_name = Path::new(id)
            .file_name()
            .ok_or_else(|| Error::NotFound("File not found".to_string()))?;
        let target = self.uploads_dir.join(file_name);

        if tokio::fs::try_exists(&target).await? {
            Ok(target)
        } else {
            Err(Error::NotFound("File not found".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn coordinator(client: MockAssetClient, uploads_dir: &Path) -> UploadCoordinator {
        UploadCoordinator::new(
            Box::new(client),
            ResourceType::ALL.to_vec(),
            uploads_dir.to_path_buf(),
        )
    }

    #[tokio::test]
    async fn test_upload_projects_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"not really a video").unwrap();

        let client = MockAssetClient::new().with_base_url("https://cdn.test".to_string());
        let summary = coordinator(client.clone(), dir.path())
            .upload(&path, "Photo")
            .await
            .unwrap();

        assert!(summary.success);
        assert!(summary.url.starts_with("https://cdn.test/video/upload/Photo/"));
        assert_eq!(summary.size, Some(18));
        assert_eq!(summary.delivery_type.as_deref(), Some("upload"));
        assert_eq!(summary.resource_type.as_deref(), Some("video"));
        assert_eq!(client.get_upload_count(), 1);
    }

    #[tokio::test]
    async fn test_upload_missing_temp_file_skips_client() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockAssetClient::new();

        let err = coordinator(client.clone(), dir.path())
            .upload(&dir.path().join("missing.tmp"), "Photo")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::TempFileMissing(_)));
        assert_eq!(client.get_upload_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_rejects_blank_id() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockAssetClient::new();

        let err = coordinator(client.clone(), dir.path())
            .delete("   ", None)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert!(client.get_destroy_calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_with_known_type_skips_sweep() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockAssetClient::new()
            .with_asset(MockAssetClient::record("Photo/doc", ResourceType::Raw, 3));

        let outcome = coordinator(client.clone(), dir.path())
            .delete("Photo/doc", Some(ResourceType::Raw))
            .await
            .unwrap();

        assert_eq!(outcome, DeleteOutcome::Ok);
        assert_eq!(
            client.get_destroy_calls(),
            vec![("Photo/doc".to_string(), ResourceType::Raw)]
        );
    }

    #[tokio::test]
    async fn test_metadata_target_uses_basename() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abc123"), b"x").unwrap();
        let coordinator = coordinator(MockAssetClient::new(), dir.path());

        let found = coordinator
            .check_metadata_target("Photo/abc123")
            .await
            .unwrap();
        assert_eq!(found, dir.path().join("abc123"));

        let err = coordinator
            .check_metadata_target("Photo/missing")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        assert!(coordinator.check_metadata_target("..").await.is_err());
    }
}
