//! Cloudinary integration for storing, listing and removing assets
//!
//! The trait covers the three primitive vendor calls; the decision logic
//! built on top of them (merging listings, the delete sweep) lives in
//! [`catalog`].

pub mod catalog;
pub mod client;
pub mod mock;

pub use client::CloudinaryClient;
pub use mock::MockAssetClient;

use crate::models::{AssetRecord, DestroyStatus, ResourceType, UploadResult};
use crate::Result;
use async_trait::async_trait;
use std::path::Path;

#[async_trait]
pub trait AssetService: Send + Sync {
    async fn upload(&self, local_path: &Path, folder: &str) -> Result<UploadResult>;
    async fn list_resources(
        &self,
        resource_type: ResourceType,
        max_results: u32,
    ) -> Result<Vec<AssetRecord>>;
    async fn destroy(&self, public_id: &str, resource_type: ResourceType) -> Result<DestroyStatus>;
}
