//! Cloudinary blob backend.
//!
//! Uploads and destroys use signed requests against the REST API
//! (`{api_base}{cloud_name}/{resource_type}/upload|destroy`). Content is
//! fetched back from the delivery URL returned at upload time.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use reqwest::{multipart, Client, StatusCode};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::{BlobError, BlobRef, BlobStore, BlobStream, ResourceKind};
use crate::config::CloudinaryConfig;
use crate::DriveError;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Blob store backed by Cloudinary.
pub struct CloudinaryStore {
    client: Client,
    config: CloudinaryConfig,
    timeout: Duration,
}

impl CloudinaryStore {
    /// Create a store.
    ///
    /// `timeout` bounds connecting and each upload or destroy call. Fetched
    /// bodies are streamed to clients and have no overall deadline.
    pub fn new(config: CloudinaryConfig, timeout: Duration) -> crate::Result<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .user_agent(concat!("minidrive/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DriveError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            config,
            timeout,
        })
    }

    fn endpoint(&self, kind: ResourceKind, action: &str) -> String {
        format!(
            "{}{}/{}/{}",
            self.config.api_base,
            self.config.cloud_name,
            kind.as_str(),
            action
        )
    }

    /// Sign a parameter set: sorted `key=value` pairs joined by `&`, followed
    /// by the API secret, hashed with SHA-256.
    fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
        let mut sorted: Vec<_> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        let to_sign = sorted
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(api_secret.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn timestamp() -> String {
        chrono::Utc::now().timestamp().to_string()
    }

    async fn error_from(response: reqwest::Response) -> BlobError {
        let status = response.status();
        match response.json::<ErrorResponse>().await {
            Ok(body) => BlobError::Provider(format!("{status}: {}", body.error.message)),
            Err(_) => BlobError::Provider(format!("unexpected status {status}")),
        }
    }
}

fn transport_error(e: reqwest::Error) -> BlobError {
    if e.is_timeout() {
        BlobError::Timeout
    } else {
        BlobError::Provider(e.to_string())
    }
}

#[async_trait]
impl BlobStore for CloudinaryStore {
    async fn put(
        &self,
        bytes: Bytes,
        file_name: &str,
        content_type: &str,
    ) -> Result<BlobRef, BlobError> {
        let kind = ResourceKind::from_content_type(content_type);
        let timestamp = Self::timestamp();
        let signature = Self::sign(
            &[
                ("folder", self.config.folder.as_str()),
                ("timestamp", timestamp.as_str()),
            ],
            &self.config.api_secret,
        );

        let length = bytes.len() as u64;
        let file_part = multipart::Part::stream_with_length(bytes, length)
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .map_err(|e| BlobError::Provider(e.to_string()))?;

        let form = multipart::Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", self.config.folder.clone())
            .text("signature_algorithm", "sha256")
            .text("signature", signature)
            .part("file", file_part);

        let response = self
            .client
            .post(self.endpoint(kind, "upload"))
            .timeout(self.timeout)
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let body: UploadResponse = response.json().await.map_err(transport_error)?;
        debug!(blob_id = %body.public_id, kind = kind.as_str(), "uploaded to cloudinary");

        Ok(BlobRef {
            blob_id: body.public_id,
            url: body.secure_url,
        })
    }

    async fn delete(&self, blob_id: &str, kind: ResourceKind) -> Result<(), BlobError> {
        let timestamp = Self::timestamp();
        let signature = Self::sign(
            &[("public_id", blob_id), ("timestamp", timestamp.as_str())],
            &self.config.api_secret,
        );

        let params = [
            ("public_id", blob_id),
            ("timestamp", timestamp.as_str()),
            ("api_key", self.config.api_key.as_str()),
            ("signature_algorithm", "sha256"),
            ("signature", signature.as_str()),
        ];

        let response = self
            .client
            .post(self.endpoint(kind, "destroy"))
            .timeout(self.timeout)
            .form(&params)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let body: DestroyResponse = response.json().await.map_err(transport_error)?;
        match body.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(BlobError::Provider(format!("destroy returned {other:?}"))),
        }
    }

    async fn fetch(&self, blob: &BlobRef) -> Result<BlobStream, BlobError> {
        let response = self
            .client
            .get(&blob.url)
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => return Err(BlobError::NotFound),
            status => return Err(BlobError::Provider(format!("unexpected status {status}"))),
        }

        let stream = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
        Ok(Box::pin(stream))
    }

    fn name(&self) -> &'static str {
        "cloudinary"
    }
}
