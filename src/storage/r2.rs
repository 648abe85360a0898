//! R2-backed signed-URL issuer.
//!
//! Works against Cloudflare R2 or any S3-compatible store (MinIO, AWS S3).
//! Only presigned GET URLs are issued here; uploads and thumbnailing belong
//! to the external admin pipeline.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::{
    config::{Builder, Region},
    presigning::PresigningConfig,
    Client,
};
use chrono::Utc;

use super::{SignedDownloadUrl, SignedReadUrl, SignedUrlIssuer, SigningError};

/// Hard ceiling on one presigning call. A hung signer fails the whole
/// gallery load rather than degrading it to a partial result.
const SIGNING_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct R2Config {
    /// Private bucket holding the client-gallery originals.
    pub bucket: String,
    /// Custom endpoint URL (R2 account endpoint, or MinIO for local dev).
    pub endpoint: Option<String>,
    /// Region; R2 accepts "auto".
    pub region: String,
    /// Force path-style URLs (required for MinIO).
    pub force_path_style: bool,
    /// Lifetime of inline read URLs, seconds.
    pub read_ttl_secs: u64,
    /// Lifetime of download URLs, seconds.
    pub download_ttl_secs: u64,
}

impl R2Config {
    /// Build from environment. Returns `None` when R2_BUCKET is unset, which
    /// leaves the gated path refusing to serve (no public-URL fallback).
    pub fn from_env() -> Option<Self> {
        let bucket = std::env::var("R2_BUCKET").ok()?;
        Some(Self {
            bucket,
            endpoint: std::env::var("R2_ENDPOINT").ok(),
            region: std::env::var("R2_REGION").unwrap_or_else(|_| "auto".to_string()),
            force_path_style: std::env::var("R2_FORCE_PATH_STYLE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
            read_ttl_secs: std::env::var("SIGNED_URL_READ_TTL")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(900),
            download_ttl_secs: std::env::var("SIGNED_URL_DOWNLOAD_TTL")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(300),
        })
    }
}

pub struct R2Storage {
    client: Client,
    bucket: String,
    read_ttl: Duration,
    download_ttl: Duration,
}

impl R2Storage {
    pub async fn new(config: R2Config) -> Self {
        let mut builder = Builder::new()
            .region(Region::new(config.region))
            .force_path_style(config.force_path_style);

        if let Some(endpoint) = config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        // Credentials come from the environment (R2 API tokens are exposed
        // as AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY).
        let sdk_config = aws_config::load_from_env().await;
        if let Some(creds) = sdk_config.credentials_provider() {
            builder = builder.credentials_provider(creds);
        }

        let client = Client::from_conf(builder.build());

        Self {
            client,
            bucket: config.bucket,
            read_ttl: Duration::from_secs(config.read_ttl_secs),
            download_ttl: Duration::from_secs(config.download_ttl_secs),
        }
    }

    fn presigning_config(&self, ttl: Duration) -> Result<PresigningConfig, SigningError> {
        PresigningConfig::expires_in(ttl).map_err(|e| SigningError::Upstream(e.to_string()))
    }
}

#[async_trait]
impl SignedUrlIssuer for R2Storage {
    async fn issue_read_url(&self, storage_key: &str) -> Result<SignedReadUrl, SigningError> {
        let presigning = self.presigning_config(self.read_ttl)?;
        let expires_at = Utc::now() + chrono::Duration::seconds(self.read_ttl.as_secs() as i64);

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(storage_key)
            .presigned(presigning);

        let presigned = tokio::time::timeout(SIGNING_TIMEOUT, request)
            .await
            .map_err(|_| SigningError::Timeout)?
            .map_err(|e| SigningError::Upstream(e.to_string()))?;

        Ok(SignedReadUrl {
            url: presigned.uri().to_string(),
            expires_at,
        })
    }

    async fn issue_download_url(
        &self,
        storage_key: &str,
        filename: &str,
    ) -> Result<SignedDownloadUrl, SigningError> {
        let presigning = self.presigning_config(self.download_ttl)?;

        // Quotes and control characters would corrupt the header value.
        let safe_name: String = filename
            .chars()
            .filter(|c| !c.is_control() && *c != '"')
            .collect();

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(storage_key)
            .response_content_disposition(format!("attachment; filename=\"{}\"", safe_name))
            .presigned(presigning);

        let presigned = tokio::time::timeout(SIGNING_TIMEOUT, request)
            .await
            .map_err(|_| SigningError::Timeout)?
            .map_err(|e| SigningError::Upstream(e.to_string()))?;

        Ok(SignedDownloadUrl {
            url: presigned.uri().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test so the R2_BUCKET mutations cannot race a parallel test.
    #[test]
    fn test_config_from_env() {
        std::env::remove_var("R2_BUCKET");
        assert!(R2Config::from_env().is_none());

        std::env::set_var("R2_BUCKET", "client-galleries");
        std::env::remove_var("SIGNED_URL_READ_TTL");
        std::env::remove_var("SIGNED_URL_DOWNLOAD_TTL");
        let config = R2Config::from_env().unwrap();
        assert_eq!(config.bucket, "client-galleries");
        assert_eq!(config.region, "auto");
        assert_eq!(config.read_ttl_secs, 900);
        assert_eq!(config.download_ttl_secs, 300);
        std::env::remove_var("R2_BUCKET");
    }
}
