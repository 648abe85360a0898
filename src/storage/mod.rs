/*!
 * Storage Module
 * Signed-URL issuance for the private image bucket. This service never
 * serves image bytes itself and never exposes raw storage keys; everything
 * the client sees is a short-lived presigned URL.
 */

pub mod r2;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::OnceCell;

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("signing request failed: {0}")]
    Upstream(String),

    #[error("signing request timed out")]
    Timeout,
}

/// A time-limited read URL for inline gallery display.
#[derive(Debug, Clone)]
pub struct SignedReadUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// A time-limited URL that triggers a browser download.
#[derive(Debug, Clone)]
pub struct SignedDownloadUrl {
    pub url: String,
}

/// Boundary to the object store's URL signer.
#[async_trait]
pub trait SignedUrlIssuer: Send + Sync {
    async fn issue_read_url(&self, storage_key: &str) -> Result<SignedReadUrl, SigningError>;

    async fn issue_download_url(
        &self,
        storage_key: &str,
        filename: &str,
    ) -> Result<SignedDownloadUrl, SigningError>;
}

static ISSUER: OnceCell<Arc<dyn SignedUrlIssuer>> = OnceCell::const_new();

/// Initialize the global issuer from environment configuration. Returns
/// false when the bucket is not configured; gated reads will refuse to serve
/// rather than fall back to public URLs.
pub async fn init_issuer() -> bool {
    let Some(config) = r2::R2Config::from_env() else {
        return false;
    };
    let storage = r2::R2Storage::new(config).await;
    let _ = ISSUER.set(Arc::new(storage));
    true
}

pub fn get_issuer() -> Option<Arc<dyn SignedUrlIssuer>> {
    ISSUER.get().cloned()
}

#[cfg(test)]
pub mod testing {
    //! Deterministic issuer for exercising the gated read path in tests.

    use super::*;
    use chrono::Duration;

    pub struct MockIssuer {
        pub fail_on_key: Option<String>,
    }

    impl MockIssuer {
        pub fn new() -> Self {
            Self { fail_on_key: None }
        }

        pub fn failing_on(key: &str) -> Self {
            Self {
                fail_on_key: Some(key.to_string()),
            }
        }
    }

    #[async_trait]
    impl SignedUrlIssuer for MockIssuer {
        async fn issue_read_url(
            &self,
            storage_key: &str,
        ) -> Result<SignedReadUrl, SigningError> {
            if self.fail_on_key.as_deref() == Some(storage_key) {
                return Err(SigningError::Timeout);
            }
            Ok(SignedReadUrl {
                url: format!("https://signed.example/{}?sig=test", storage_key),
                expires_at: Utc::now() + Duration::minutes(15),
            })
        }

        async fn issue_download_url(
            &self,
            storage_key: &str,
            filename: &str,
        ) -> Result<SignedDownloadUrl, SigningError> {
            if self.fail_on_key.as_deref() == Some(storage_key) {
                return Err(SigningError::Timeout);
            }
            Ok(SignedDownloadUrl {
                url: format!(
                    "https://signed.example/{}?sig=test&dl={}",
                    storage_key, filename
                ),
            })
        }
    }
}
