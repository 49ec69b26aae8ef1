use super::AssetService;
use crate::mime::{guess_mime_from_name, resource_type_for_mime};
use crate::models::{AssetRecord, DestroyStatus, ResourceType, UploadResult};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// In-memory stand-in for Cloudinary, keyed by resource type like the real namespaces.
#[derive(Clone)]
pub struct MockAssetClient {
    assets: Arc<Mutex<HashMap<ResourceType, Vec<AssetRecord>>>>,
    failing_lists: Arc<Mutex<HashSet<ResourceType>>>,
    failing_destroys: Arc<Mutex<HashSet<ResourceType>>>,
    destroy_overrides: Arc<Mutex<HashMap<ResourceType, String>>>,
    destroy_calls: Arc<Mutex<Vec<(String, ResourceType)>>>,
    upload_failure: Arc<Mutex<Option<String>>>,
    base_url: String,
    upload_count: Arc<Mutex<usize>>,
    list_count: Arc<Mutex<usize>>,
}

impl MockAssetClient {
    pub fn new() -> Self {
        Self {
            assets: Arc::new(Mutex::new(HashMap::new())),
            failing_lists: Arc::new(Mutex::new(HashSet::new())),
            failing_destroys: Arc::new(Mutex::new(HashSet::new())),
            destroy_overrides: Arc::new(Mutex::new(HashMap::new())),
            destroy_calls: Arc::new(Mutex::new(Vec::new())),
            upload_failure: Arc::new(Mutex::new(None)),
            base_url: "https://res.mock-cloudinary.example.com".to_string(),
            upload_count: Arc::new(Mutex::new(0)),
            list_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_asset(self, record: AssetRecord) -> Self {
        let resource_type = record
            .resource_type
            .as_deref()
            .and_then(|rt| rt.parse().ok())
            .unwrap_or(ResourceType::Image);
        self.assets
            .lock()
            .unwrap()
            .entry(resource_type)
            .or_default()
            .push(record);
        self
    }

    /// Reject every upload with `message`, as a vendor error would.
    pub fn with_upload_failure(self, message: &str) -> Self {
        *self.upload_failure.lock().unwrap() = Some(message.to_string());
        self
    }

    /// Make listing of `resource_type` fail.
    pub fn with_list_failure(self, resource_type: ResourceType) -> Self {
        self.failing_lists.lock().unwrap().insert(resource_type);
        self
    }

    /// Make destroy calls against `resource_type` fail.
    pub fn with_destroy_failure(self, resource_type: ResourceType) -> Self {
        self.failing_destroys.lock().unwrap().insert(resource_type);
        self
    }

    /// Answer destroy calls against `resource_type` with a fixed raw result.
    pub fn with_destroy_result(self, resource_type: ResourceType, result: &str) -> Self {
        self.destroy_overrides
            .lock()
            .unwrap()
            .insert(resource_type, result.to_string());
        self
    }

    /// Build a record the way the admin API would report it.
    pub fn record(public_id: &str, resource_type: ResourceType, bytes: u64) -> AssetRecord {
        AssetRecord {
            public_id: public_id.to_string(),
            secure_url: Some(format!(
                "https://res.mock-cloudinary.example.com/{}/upload/{}",
                resource_type, public_id
            )),
            resource_type: Some(resource_type.to_string()),
            delivery_type: Some("upload".to_string()),
            bytes: Some(bytes),
            created_at: Some("2025-01-01T00:00:00Z".to_string()),
            state: None,
        }
    }

    pub fn get_upload_count(&self) -> usize {
        *self.upload_count.lock().unwrap()
    }

    pub fn get_list_count(&self) -> usize {
        *self.list_count.lock().unwrap()
    }

    /// Destroy calls in the order they were made.
    pub fn get_destroy_calls(&self) -> Vec<(String, ResourceType)> {
        self.destroy_calls.lock().unwrap().clone()
    }

    pub fn get_assets(&self, resource_type: ResourceType) -> Vec<AssetRecord> {
        self.assets
            .lock()
            .unwrap()
            .get(&resource_type)
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for MockAssetClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssetService for MockAssetClient {
    async fn upload(&self, local_path: &Path, folder: &str) -> Result<UploadResult> {
        let metadata = tokio::fs::metadata(local_path).await.map_err(|e| {
            Error::UploadFailed(format!(
                "Cannot read local file {}: {}",
                local_path.display(),
                e
            ))
        })?;

        *self.upload_count.lock().unwrap() += 1;

        if let Some(message) = self.upload_failure.lock().unwrap().clone() {
            return Err(Error::UploadFailed(message));
        }

        let file_name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let resource_type = guess_mime_from_name(&file_name)
            .map(resource_type_for_mime)
            .unwrap_or(ResourceType::Raw);

        let public_id = format!("{}/{}", folder, Uuid::new_v4().simple());
        let secure_url = format!("{}/{}/upload/{}", self.base_url, resource_type, public_id);

        let mut record = Self::record(&public_id, resource_type, metadata.len());
        record.secure_url = Some(secure_url.clone());
        record.created_at = Some(chrono::Utc::now().to_rfc3339());
        self.assets
            .lock()
            .unwrap()
            .entry(resource_type)
            .or_default()
            .push(record);

        Ok(UploadResult {
            secure_url: Some(secure_url),
            public_id,
            bytes: Some(metadata.len()),
            resource_type: Some(resource_type.to_string()),
            delivery_type: Some("upload".to_string()),
        })
    }

    async fn list_resources(
        &self,
        resource_type: ResourceType,
        max_results: u32,
    ) -> Result<Vec<AssetRecord>> {
        *self.list_count.lock().unwrap() += 1;

        if self.failing_lists.lock().unwrap().contains(&resource_type) {
            return Err(Error::Upstream(format!(
                "Mock listing failure for {}",
                resource_type
            )));
        }

        Ok(self
            .get_assets(resource_type)
            .into_iter()
            .take(max_results as usize)
            .collect())
    }

    async fn destroy(&self, public_id: &str, resource_type: ResourceType) -> Result<DestroyStatus> {
        self.destroy_calls
            .lock()
            .unwrap()
            .push((public_id.to_string(), resource_type));

        if self.failing_destroys.lock().unwrap().contains(&resource_type) {
            return Err(Error::Upstream(format!(
                "Mock destroy failure for {}",
                resource_type
            )));
        }

        if let Some(raw) = self.destroy_overrides.lock().unwrap().get(&resource_type) {
            return Ok(DestroyStatus::from_result(raw));
        }

        let mut assets = self.assets.lock().unwrap();
        let namespace = assets.entry(resource_type).or_default();
        let before = namespace.len();
        namespace.retain(|r| r.public_id != public_id);

        if namespace.len() < before {
            Ok(DestroyStatus::Ok)
        } else {
            Ok(DestroyStatus::NotFound)
        }
    }
}
