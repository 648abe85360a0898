/*!
 * Access Module
 * Token-gated client gallery access: code hashing, token store, session
 * binding, and the favorite/download ledger.
 */

pub mod code;
pub mod ledger;
pub mod session;
pub mod store;

use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

use crate::routes::ErrorResponse;
use crate::storage::SigningError;

/// Failure taxonomy for the gated gallery path.
///
/// `Expired` and `Revoked` are distinct for server-side logging but render
/// identically to the client, so a guessed code never reveals whether it once
/// existed.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("no matching access token")]
    NotFound,

    #[error("access token expired")]
    Expired,

    #[error("access token revoked")]
    Revoked,

    #[error("downloads are not enabled for this token")]
    DownloadsDisabled,

    #[error("download limit reached")]
    QuotaExceeded,

    #[error("gallery has images without a storage key")]
    StorageInconsistent,

    #[error("signed URL issuance failed: {0}")]
    UpstreamSigning(#[from] SigningError),

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Generic message for the NotFound/Expired/Revoked collapse.
const NOT_VALID_MESSAGE: &str = "This access code is not valid or has expired.";

impl IntoResponse for AccessError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            // Collapsed on purpose: the three states are logged distinctly
            // below but must be indistinguishable to the caller.
            AccessError::NotFound | AccessError::Expired | AccessError::Revoked => {
                tracing::info!(kind = ?self, "gallery access denied");
                (StatusCode::UNAUTHORIZED, NOT_VALID_MESSAGE.to_string())
            }
            AccessError::DownloadsDisabled => (
                StatusCode::FORBIDDEN,
                "Downloads are not enabled for this gallery.".to_string(),
            ),
            AccessError::QuotaExceeded => (
                StatusCode::FORBIDDEN,
                "The download limit for this gallery has been reached.".to_string(),
            ),
            AccessError::StorageInconsistent => {
                // Bad data entry, not a runtime condition. Needs an operator.
                tracing::error!("gallery has images with no storage key; refusing partial gallery");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "This gallery is temporarily unavailable.".to_string(),
                )
            }
            AccessError::UpstreamSigning(e) => {
                tracing::error!("signed URL issuance failed: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "Could not prepare image links. Please try again.".to_string(),
                )
            }
            AccessError::Db(e) => {
                tracing::error!("database error on gallery access path: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong. Please try again.".to_string(),
                )
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: message,
                message: None,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: AccessError) -> (StatusCode, String) {
        let res = err.into_response();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_not_found_expired_revoked_render_identically() {
        let (s1, b1) = body_of(AccessError::NotFound).await;
        let (s2, b2) = body_of(AccessError::Expired).await;
        let (s3, b3) = body_of(AccessError::Revoked).await;
        assert_eq!(s1, StatusCode::UNAUTHORIZED);
        assert_eq!(s1, s2);
        assert_eq!(s2, s3);
        assert_eq!(b1, b2);
        assert_eq!(b2, b3);
    }

    #[tokio::test]
    async fn test_downloads_disabled_is_forbidden() {
        let (status, _) = body_of(AccessError::DownloadsDisabled).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_quota_exceeded_is_forbidden() {
        let (status, _) = body_of(AccessError::QuotaExceeded).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_storage_inconsistent_is_internal_error() {
        let (status, body) = body_of(AccessError::StorageInconsistent).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        // The operator-facing cause never reaches the client.
        assert!(!body.contains("storage key"));
    }

    #[tokio::test]
    async fn test_signing_failure_is_bad_gateway() {
        let (status, _) =
            body_of(AccessError::UpstreamSigning(SigningError::Timeout)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }
}
