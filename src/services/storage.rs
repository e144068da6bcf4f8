//! Object storage client
//!
//! Uploads enhanced images, downloads raw images by URL, and issues
//! presigned PUT URLs for direct client uploads. Raw images are fetched over
//! plain HTTP because products reference them by public URL, not by key.

use crate::config::S3Config;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use std::time::Duration;
use tracing::info;

/// Result of issuing a presigned upload URL
#[derive(Debug, Clone)]
pub struct PresignedUpload {
    /// URL the client PUTs the file to
    pub upload_url: String,
    /// Public URL the object will be readable at after upload
    pub public_url: String,
    pub expires_in_secs: u64,
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Fetch raw object bytes by public URL
    async fn download(&self, url: &str) -> Result<Bytes>;

    /// Store an object under `key` and return its public URL
    async fn upload(&self, key: &str, data: Bytes, content_type: &str) -> Result<String>;

    /// Issue a time-limited presigned PUT URL for `key`
    async fn presign_upload(&self, key: &str, content_type: &str) -> Result<PresignedUpload>;
}

/// Initialize an AWS S3 client with credentials from config
///
/// Falls back to the default credential chain when no explicit keys are
/// configured; a custom endpoint supports S3-compatible storage like MinIO.
pub async fn s3_client(config: &S3Config) -> aws_sdk_s3::Client {
    use aws_sdk_s3::config::Region;

    let mut builder = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(config.region.clone()));

    if let (Some(access_key_id), Some(secret_access_key)) =
        (&config.access_key_id, &config.secret_access_key)
    {
        use aws_sdk_s3::config::Credentials;

        let credentials = Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            "catalog_service_s3",
        );
        builder = builder.credentials_provider(credentials);
    }

    if let Some(endpoint) = &config.endpoint {
        builder = builder.endpoint_url(endpoint);
    }

    let aws_config = builder.load().await;
    aws_sdk_s3::Client::new(&aws_config)
}

/// S3-backed object storage
pub struct S3ObjectStorage {
    s3: aws_sdk_s3::Client,
    http: reqwest::Client,
    bucket: String,
    region: String,
    cdn_domain: Option<String>,
    presign_expiry: Duration,
}

impl S3ObjectStorage {
    pub fn new(s3: aws_sdk_s3::Client, config: &S3Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {e}")))?;

        info!(bucket = %config.bucket, region = %config.region, "S3 storage initialized");

        Ok(Self {
            s3,
            http,
            bucket: config.bucket.clone(),
            region: config.region.clone(),
            cdn_domain: config.cdn_domain.clone(),
            presign_expiry: Duration::from_secs(config.presigned_url_expiration_secs),
        })
    }

    /// Public URL for a stored object, preferring the CDN domain when set
    fn public_url(&self, key: &str) -> String {
        match &self.cdn_domain {
            Some(domain) => format!("https://{}/{}", domain, key),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            ),
        }
    }
}

#[async_trait]
impl ObjectStorage for S3ObjectStorage {
    async fn download(&self, url: &str) -> Result<Bytes> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to download {url}: {e}")))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("Object not found: {url}")));
        }
        if !response.status().is_success() {
            return Err(AppError::Storage(format!(
                "Download of {url} failed with status {}",
                response.status()
            )));
        }

        response
            .bytes()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to read body of {url}: {e}")))
    }

    async fn upload(&self, key: &str, data: Bytes, content_type: &str) -> Result<String> {
        self.s3
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data.to_vec()))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                let msg = e.to_string();
                if msg.contains("403") || msg.contains("Forbidden") {
                    AppError::Storage("S3 auth failed (403): check AWS credentials".to_string())
                } else if msg.contains("NoSuchBucket") {
                    AppError::Storage(format!("S3 bucket not found: {}", self.bucket))
                } else {
                    AppError::Storage(format!("S3 upload of {key} failed: {e}"))
                }
            })?;

        Ok(self.public_url(key))
    }

    async fn presign_upload(&self, key: &str, content_type: &str) -> Result<PresignedUpload> {
        let presigning_config = PresigningConfig::builder()
            .expires_in(self.presign_expiry)
            .build()
            .map_err(|e| AppError::Storage(format!("Failed to create presigning config: {e}")))?;

        let presigned = self
            .s3
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(presigning_config)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to presign upload: {e}")))?;

        Ok(PresignedUpload {
            upload_url: presigned.uri().to_string(),
            public_url: self.public_url(key),
            expires_in_secs: self.presign_expiry.as_secs(),
        })
    }
}

/// Guess a MIME type from a URL or filename extension, defaulting to JPEG
pub fn content_type_for_path(path: &str) -> &'static str {
    let trimmed = path.split('?').next().unwrap_or(path);
    match trimmed.rsplit('.').next().map(|ext| ext.to_ascii_lowercase()) {
        Some(ext) if ext == "png" => "image/png",
        Some(ext) if ext == "gif" => "image/gif",
        Some(ext) if ext == "webp" => "image/webp",
        _ => "image/jpeg",
    }
}

/// File extension for a MIME type, defaulting to jpg
pub fn extension_for_content_type(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "jpg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_ignores_query_string() {
        assert_eq!(
            content_type_for_path("https://cdn.example.com/a/b.png?X-Amz-Signature=abc"),
            "image/png"
        );
    }

    #[test]
    fn content_type_defaults_to_jpeg() {
        assert_eq!(content_type_for_path("https://cdn.example.com/raw"), "image/jpeg");
        assert_eq!(content_type_for_path("photo.jpeg"), "image/jpeg");
    }

    #[test]
    fn extension_round_trip() {
        assert_eq!(extension_for_content_type("image/webp"), "webp");
        assert_eq!(extension_for_content_type("application/octet-stream"), "jpg");
    }
}
