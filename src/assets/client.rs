use super::AssetService;
use crate::models::{
    AssetRecord, CloudinaryCredentials, DestroyResponse, DestroyStatus, ListResourcesResponse,
    ResourceType, SignatureAlgorithm, UploadResult,
};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.cloudinary.com";

pub struct CloudinaryClient {
    client: Client,
    credentials: CloudinaryCredentials,
    base_url: String,
    signature_algorithm: SignatureAlgorithm,
}

impl CloudinaryClient {
    pub fn new(credentials: CloudinaryCredentials, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            credentials,
            base_url: DEFAULT_BASE_URL.to_string(),
            signature_algorithm: SignatureAlgorithm::default(),
        })
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_signature_algorithm(mut self, algorithm: SignatureAlgorithm) -> Self {
        self.signature_algorithm = algorithm;
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/v1_1/{}/{}",
            self.base_url, self.credentials.cloud_name, path
        )
    }

    /// Add `timestamp`, `api_key` and `signature` to a signed API call.
    ///
    /// `signature_algorithm` is only sent for SHA-256; SHA-1 is what Cloudinary
    /// assumes when the field is absent.
    fn signed_params(&self, mut params: Vec<(String, String)>) -> Vec<(String, String)> {
        params.push((
            "timestamp".to_string(),
            chrono::Utc::now().timestamp().to_string(),
        ));
        let signature = sign_params(
            &params,
            &self.credentials.api_secret,
            self.signature_algorithm,
        );

        params.push(("api_key".to_string(), self.credentials.api_key.clone()));
        params.push(("signature".to_string(), signature));
        if self.signature_algorithm == SignatureAlgorithm::Sha256 {
            params.push((
                "signature_algorithm".to_string(),
                SignatureAlgorithm::Sha256.as_str().to_string(),
            ));
        }
        params
    }
}

/// The string Cloudinary signs: non-empty params sorted by key, joined as a query string.
pub fn string_to_sign(params: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Hex digest of the string to sign followed by the API secret.
pub fn sign_params(
    params: &[(String, String)],
    api_secret: &str,
    algorithm: SignatureAlgorithm,
) -> String {
    let payload = string_to_sign(params);
    match algorithm {
        SignatureAlgorithm::Sha1 => hex_digest::<Sha1>(&payload, api_secret),
        SignatureAlgorithm::Sha256 => hex_digest::<Sha256>(&payload, api_secret),
    }
}

fn hex_digest<D: Digest>(payload: &str, api_secret: &str) -> String {
    let mut hasher = D::new();
    hasher.update(payload.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Turn a non-2xx response into a readable message, preferring Cloudinary's own error text.
async fn failure_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    format!("status {}: {}", status, detail)
}

#[async_trait]
impl AssetService for CloudinaryClient {
    async fn upload(&self, local_path: &Path, folder: &str) -> Result<UploadResult> {
        let data = tokio::fs::read(local_path).await.map_err(|e| {
            Error::UploadFailed(format!(
                "Cannot read local file {}: {}",
                local_path.display(),
                e
            ))
        })?;
        let file_name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        tracing::debug!("Uploading {} ({} bytes) to folder {}", file_name, data.len(), folder);

        let params = self.signed_params(vec![("folder".to_string(), folder.to_string())]);
        let mut form = Form::new().part("file", Part::bytes(data).file_name(file_name));
        for (key, value) in params {
            form = form.text(key, value);
        }

        let response = self
            .client
            .post(self.endpoint("auto/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send upload request to Cloudinary: {}", e);
                Error::UploadFailed(e.to_string())
            })?;

        if !response.status().is_success() {
            let message = failure_message(response).await;
            tracing::error!("Cloudinary upload error ({})", message);
            return Err(Error::UploadFailed(message));
        }

        let body = response.text().await?;
        let result: UploadResult = serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse Cloudinary upload response: {}\nBody: {}", e, body);
            Error::UploadFailed(format!("Invalid upload response: {}", e))
        })?;

        if result.secure_url.is_none() {
            return Err(Error::UploadFailed(
                "Invalid upload response: missing secure_url".to_string(),
            ));
        }

        Ok(result)
    }

    async fn list_resources(
        &self,
        resource_type: ResourceType,
        max_results: u32,
    ) -> Result<Vec<AssetRecord>> {
        let response = self
            .client
            .get(self.endpoint(&format!("resources/{}", resource_type)))
            .query(&[("max_results", max_results.to_string())])
            .basic_auth(
                &self.credentials.api_key,
                Some(&self.credentials.api_secret),
            )
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("Failed to list {} resources: {}", resource_type, e)))?;

        if !response.status().is_success() {
            let message = failure_message(response).await;
            return Err(Error::Upstream(format!(
                "Listing {} resources failed ({})",
                resource_type, message
            )));
        }

        let listing: ListResourcesResponse = response.json().await.map_err(|e| {
            Error::Upstream(format!("Invalid {} listing response: {}", resource_type, e))
        })?;
        Ok(listing.resources)
    }

    async fn destroy(&self, public_id: &str, resource_type: ResourceType) -> Result<DestroyStatus> {
        let params = self.signed_params(vec![
            ("public_id".to_string(), public_id.to_string()),
            ("invalidate".to_string(), "true".to_string()),
        ]);

        let response = self
            .client
            .post(self.endpoint(&format!("{}/destroy", resource_type)))
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("Failed to destroy {} as {}: {}", public_id, resource_type, e)))?;

        if !response.status().is_success() {
            let message = failure_message(response).await;
            return Err(Error::Upstream(format!(
                "Destroying {} as {} failed ({})",
                public_id, resource_type, message
            )));
        }

        let destroyed: DestroyResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("Invalid destroy response: {}", e)))?;
        Ok(DestroyStatus::from_result(&destroyed.result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> CloudinaryClient {
        CloudinaryClient::new(
            CloudinaryCredentials {
                cloud_name: "demo".to_string(),
                api_key: "key".to_string(),
                api_secret: "secret".to_string(),
            },
            Duration::from_secs(5),
        )
        .unwrap()
        .with_base_url(server.uri())
    }

    #[test]
    fn test_string_to_sign_sorts_and_skips_empty() {
        let params = vec![
            ("timestamp".to_string(), "1315060510".to_string()),
            ("public_id".to_string(), "".to_string()),
            ("folder".to_string(), "Photo".to_string()),
        ];
        assert_eq!(string_to_sign(&params), "folder=Photo&timestamp=1315060510");
    }

    #[test]
    fn test_sign_params_defaults_to_sha1() {
        let params = vec![
            ("timestamp".to_string(), "1315060510".to_string()),
            ("public_id".to_string(), "sample_image".to_string()),
            (
                "eager".to_string(),
                "w_400,h_300,c_pad|w_260,h_200,c_crop".to_string(),
            ),
        ];
        let signature = sign_params(&params, "abcd", SignatureAlgorithm::default());

        let mut hasher = Sha1::new();
        hasher.update(
            b"eager=w_400,h_300,c_pad|w_260,h_200,c_crop&public_id=sample_image&timestamp=1315060510abcd",
        );
        assert_eq!(signature, hex::encode(hasher.finalize()));
        assert_eq!(signature, "bfd09f95f331f558cbd1320e67aa8d488770583e");
        assert_eq!(signature.len(), 40);
    }

    #[test]
    fn test_sign_params_is_hex_sha256() {
        let params = vec![("timestamp".to_string(), "1315060510".to_string())];
        let signature = sign_params(&params, "abcd", SignatureAlgorithm::Sha256);

        let mut hasher = Sha256::new();
        hasher.update(b"timestamp=1315060510abcd");
        assert_eq!(signature, hex::encode(hasher.finalize()));
        assert_eq!(signature.len(), 64);
    }

    #[tokio::test]
    async fn test_upload_returns_secure_url() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1_1/demo/auto/upload"))
            .and(body_string_contains("Photo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "public_id": "Photo/abc123",
                "secure_url": "https://res.cloudinary.com/demo/image/upload/Photo/abc123.jpg",
                "bytes": 4,
                "resource_type": "image",
                "type": "upload"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), [0xFF, 0xD8, 0xFF, 0xE0]).unwrap();

        let result = test_client(&server)
            .upload(file.path(), "Photo")
            .await
            .unwrap();
        assert_eq!(result.public_id, "Photo/abc123");
        assert_eq!(result.bytes, Some(4));
        assert!(result.secure_url.is_some());
    }

    #[tokio::test]
    async fn test_upload_without_secure_url_fails() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1_1/demo/auto/upload"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "public_id": "Photo/abc123" })),
            )
            .mount(&server)
            .await;

        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"data").unwrap();

        let err = test_client(&server)
            .upload(file.path(), "Photo")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UploadFailed(_)));
        assert!(err.to_string().contains("secure_url"));
    }

    #[tokio::test]
    async fn test_upload_missing_local_file_fails_before_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = test_client(&server)
            .upload(&dir.path().join("gone.jpg"), "Photo")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UploadFailed(_)));
    }

    #[tokio::test]
    async fn test_upload_surfaces_vendor_error_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1_1/demo/auto/upload"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": { "message": "Invalid Signature" }
            })))
            .mount(&server)
            .await;

        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"data").unwrap();

        let err = test_client(&server)
            .upload(file.path(), "Photo")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid Signature"));
    }

    #[tokio::test]
    async fn test_list_resources_uses_basic_auth_and_limit() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1_1/demo/resources/video"))
            .and(query_param("max_results", "100"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "resources": [
                    { "public_id": "Photo/clip", "resource_type": "video", "bytes": 10 }
                ]
            })))
            .mount(&server)
            .await;

        let records = test_client(&server)
            .list_resources(ResourceType::Video, 100)
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].public_id, "Photo/clip");
    }

    #[tokio::test]
    async fn test_list_resources_error_is_upstream() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1_1/demo/resources/raw"))
            .respond_with(ResponseTemplate::new(500).set_body_string("server error"))
            .mount(&server)
            .await;

        let err = test_client(&server)
            .list_resources(ResourceType::Raw, 100)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
    }

    #[tokio::test]
    async fn test_sha1_destroy_omits_signature_algorithm() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1_1/demo/image/destroy"))
            .and(body_string_contains("signature="))
            .and(|req: &wiremock::Request| {
                !String::from_utf8_lossy(&req.body).contains("signature_algorithm")
            })
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "result": "ok" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let status = test_client(&server)
            .destroy("Photo/abc123", ResourceType::Image)
            .await
            .unwrap();
        assert_eq!(status, DestroyStatus::Ok);
    }

    #[tokio::test]
    async fn test_sha256_destroy_declares_signature_algorithm() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1_1/demo/image/destroy"))
            .and(body_string_contains("signature_algorithm=sha256"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "result": "ok" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let status = test_client(&server)
            .with_signature_algorithm(SignatureAlgorithm::Sha256)
            .destroy("Photo/abc123", ResourceType::Image)
            .await
            .unwrap();
        assert_eq!(status, DestroyStatus::Ok);
    }

    #[tokio::test]
    async fn test_destroy_classifies_result() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1_1/demo/image/destroy"))
            .and(body_string_contains("invalidate=true"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "result": "not found" })),
            )
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1_1/demo/raw/destroy"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "result": "ok" })),
            )
            .mount(&server)
            .await;

        let client = test_client(&server);
        assert_eq!(
            client.destroy("Photo/abc123", ResourceType::Image).await.unwrap(),
            DestroyStatus::NotFound
        );
        assert_eq!(
            client.destroy("Photo/abc123", ResourceType::Raw).await.unwrap(),
            DestroyStatus::Ok
        );
    }
}
