//! Data models and structures
//!
//! Defines the asset records exchanged with Cloudinary, the outcomes the
//! gateway derives from them, and the environment configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

/// Cloudinary keeps an independent public-id namespace per resource type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Image,
    Video,
    Raw,
}

impl ResourceType {
    /// Listing and delete-sweep order used when nothing else is configured.
    pub const ALL: [ResourceType; 3] = [ResourceType::Image, ResourceType::Video, ResourceType::Raw];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Image => "image",
            ResourceType::Video => "video",
            ResourceType::Raw => "raw",
        }
    }

    /// Parse a comma-separated list such as `image,video,raw`.
    ///
    /// Duplicates are dropped, keeping the first occurrence.
    pub fn parse_list(input: &str) -> Result<Vec<ResourceType>> {
        let mut types = Vec::new();
        for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let parsed: ResourceType = part
                .parse()
                .map_err(|e: Error| Error::Config(e.to_string()))?;
            if !types.contains(&parsed) {
                types.push(parsed);
            }
        }

        if types.is_empty() {
            return Err(Error::Config(format!(
                "Resource type list '{}' is empty",
                input
            )));
        }
        Ok(types)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" => Ok(ResourceType::Image),
            "video" => Ok(ResourceType::Video),
            "raw" => Ok(ResourceType::Raw),
            other => Err(Error::Validation(format!(
                "Unknown resource type '{}'",
                other
            ))),
        }
    }
}

/// An asset as reported by the Cloudinary admin API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetRecord {
    pub public_id: String,
    #[serde(default)]
    pub secure_url: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
    /// Delivery type (`upload`, `private`, ...).
    #[serde(rename = "type", default)]
    pub delivery_type: Option<String>,
    #[serde(default)]
    pub bytes: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

impl AssetRecord {
    pub fn is_deleted(&self) -> bool {
        self.state.as_deref() == Some("deleted")
    }

    /// Last path segment of the public id, used as a display name.
    pub fn display_name(&self) -> &str {
        self.public_id
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("file")
    }
}

/// Upload API response, reduced to the fields the gateway uses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadResult {
    #[serde(default)]
    pub secure_url: Option<String>,
    pub public_id: String,
    #[serde(default)]
    pub bytes: Option<u64>,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(rename = "type", default)]
    pub delivery_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListResourcesResponse {
    #[serde(default)]
    pub resources: Vec<AssetRecord>,
}

#[derive(Debug, Deserialize)]
pub struct DestroyResponse {
    pub result: String,
}

/// Classified `result` field of a destroy call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestroyStatus {
    Ok,
    NotFound,
    Other(String),
}

impl DestroyStatus {
    pub fn from_result(result: &str) -> Self {
        match result {
            "ok" => DestroyStatus::Ok,
            // The API answers "not found"; older SDKs normalise it to "not_found".
            "not found" | "not_found" => DestroyStatus::NotFound,
            other => DestroyStatus::Other(other.to_string()),
        }
    }
}

/// Final answer of a delete request, after the resource-type sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Ok,
    NotFound,
    /// No namespace confirmed the delete; carries the last raw vendor result.
    Failed(String),
}

impl DeleteOutcome {
    /// `ok` and `not_found` both leave the asset absent, which is what the caller asked for.
    pub fn is_success(&self) -> bool {
        matches!(self, DeleteOutcome::Ok | DeleteOutcome::NotFound)
    }

    pub fn as_result_str(&self) -> &str {
        match self {
            DeleteOutcome::Ok => "ok",
            DeleteOutcome::NotFound => "not_found",
            DeleteOutcome::Failed(raw) => raw,
        }
    }
}

/// Merged listing across resource types.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub assets: Vec<AssetRecord>,
    /// Resource types whose fetch failed and were left out of `assets`.
    pub skipped: Vec<ResourceType>,
}

/// Digest used for signed upload/destroy calls.
///
/// Accounts verify SHA-1 unless they were switched to SHA-256.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

impl SignatureAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureAlgorithm::Sha1 => "sha1",
            SignatureAlgorithm::Sha256 => "sha256",
        }
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha1" | "sha-1" => Ok(SignatureAlgorithm::Sha1),
            "sha256" | "sha-256" => Ok(SignatureAlgorithm::Sha256),
            other => Err(Error::Config(format!(
                "Unknown signature algorithm '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CloudinaryCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// `None` only in dry-run mode.
    pub credentials: Option<CloudinaryCredentials>,
    pub api_base: String,
    pub signature_algorithm: SignatureAlgorithm,
    pub upload_folder: String,
    pub delete_order: Vec<ResourceType>,
    pub uploads_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub dry_run: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_env_with_dry_run(false)
    }

    /// Like [`Config::from_env`], but `force_dry_run` switches dry-run on
    /// regardless of `DRY_RUN`.
    pub fn from_env_with_dry_run(force_dry_run: bool) -> Result<Self> {
        dotenvy::dotenv().ok();

        let dry_run = force_dry_run || dry_run_enabled(std::env::var("DRY_RUN").ok().as_deref());

        let credentials = if dry_run {
            None
        } else {
            Some(CloudinaryCredentials {
                cloud_name: required_var("CLOUDINARY_NAME")?,
                api_key: required_var("CLOUDINARY_KEY")?,
                api_secret: required_var("CLOUDINARY_SECRET")?,
            })
        };

        let delete_order = match std::env::var("CLOUDINARY_DELETE_ORDER") {
            Ok(raw) => ResourceType::parse_list(&raw)?,
            Err(_) => ResourceType::ALL.to_vec(),
        };

        let signature_algorithm = match std::env::var("CLOUDINARY_SIGNATURE_ALGORITHM") {
            Ok(raw) if !raw.trim().is_empty() => raw.parse()?,
            _ => SignatureAlgorithm::default(),
        };

        let bind_addr: SocketAddr = std::env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .map_err(|e| Error::Config(format!("Invalid BIND_ADDR: {}", e)))?;

        Ok(Self {
            credentials,
            api_base: std::env::var("CLOUDINARY_API_BASE")
                .unwrap_or_else(|_| "https://api.cloudinary.com".to_string()),
            signature_algorithm,
            upload_folder: std::env::var("CLOUDINARY_FOLDER").unwrap_or_else(|_| "Photo".to_string()),
            delete_order,
            uploads_dir: std::env::var("UPLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("uploads")),
            bind_addr,
            dry_run,
        })
    }
}

fn dry_run_enabled(value: Option<&str>) -> bool {
    value
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(false)
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::Config(format!("{} not set", name)))
}
