/**
 * Client Gallery Routes
 * Token-gated gallery viewing, favorites, and downloads
 */
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::ConnectInfo,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::access::{ledger, session, store, AccessError};
use crate::db::{
    self,
    models::{AccessToken, Gallery, GalleryImage},
};
use crate::routes::ErrorResponse;
use crate::storage::{self, SignedUrlIssuer, SigningError};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body for POST /api/client/gallery. The code may be omitted on return
/// visits that carry a bound session.
#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryResponse {
    pub success: bool,
    pub gallery: GalleryPayload,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryPayload {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    pub allow_download: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub images: Vec<ImagePayload>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    pub id: Uuid,
    /// Short-lived signed read URL; never the raw storage key.
    pub url: String,
    pub url_expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub sort_order: i32,
    pub is_hero: bool,
    pub is_favorite: bool,
}

/// Body for POST /api/client/favorite.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRequest {
    pub image_id: Uuid,
    pub action: String,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteResponse {
    pub success: bool,
    pub action: String,
}

/// Body for POST /api/client/download.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    #[serde(default)]
    pub image_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub download_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleDownloadResponse {
    pub success: bool,
    pub download_url: String,
    pub filename: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDownloadResponse {
    pub success: bool,
    pub downloads: Vec<BatchDownloadItem>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDownloadItem {
    pub id: Uuid,
    pub url: String,
    pub filename: String,
}

// ============================================================================
// Helpers
// ============================================================================

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
            message: None,
        }),
    )
        .into_response()
}

fn db_unavailable() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse {
            error: "Database not available".to_string(),
            message: None,
        }),
    )
        .into_response()
}

fn image_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Image not found".to_string(),
            message: None,
        }),
    )
        .into_response()
}

fn client_meta(addr: &SocketAddr, headers: &HeaderMap) -> (Option<String>, Option<String>) {
    let ip = Some(addr.ip().to_string());
    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    (ip, user_agent)
}

/// The signed-URL issuer, or an upstream failure when not configured.
/// Serving permanent public links instead is not an option on this path.
fn signer() -> Result<Arc<dyn SignedUrlIssuer>, AccessError> {
    storage::get_issuer().ok_or_else(|| {
        AccessError::UpstreamSigning(SigningError::Upstream(
            "signed-url issuer not configured".to_string(),
        ))
    })
}

/// Resolve a credential to a usable token. A fresh plaintext code takes
/// precedence; otherwise the bound session is re-resolved by id. Both paths
/// converge on the same usability check, and a session pointing at a dead or
/// unusable token is unbound on the way out.
async fn resolve_credential(
    pool: &PgPool,
    cookies: &Cookies,
    code: Option<&str>,
) -> Result<AccessToken, AccessError> {
    let (token, from_session) = match code {
        Some(code) => (store::find_by_plaintext_code(pool, code).await?, false),
        None => (session::resolve(pool, cookies).await?, true),
    };

    let Some(token) = token else {
        if from_session {
            session::clear(cookies);
        }
        return Err(AccessError::NotFound);
    };

    if let Err(e) = store::ensure_usable(&token) {
        if from_session {
            session::clear(cookies);
        }
        return Err(e);
    }

    Ok(token)
}

async fn load_gallery(pool: &PgPool, gallery_id: Uuid) -> Result<Gallery, AccessError> {
    sqlx::query_as::<_, Gallery>(
        r#"
        SELECT id, slug, title, client_name, published, created_at, updated_at
        FROM galleries WHERE id = $1
        "#,
    )
    .bind(gallery_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AccessError::NotFound)
}

const IMAGE_COLUMNS: &str = "id, gallery_id, storage_key, url, thumb_url, full_url, alt, \
     filename, sort_order, is_hero";

async fn load_images(pool: &PgPool, gallery_id: Uuid) -> Result<Vec<GalleryImage>, AccessError> {
    Ok(sqlx::query_as::<_, GalleryImage>(&format!(
        "SELECT {} FROM gallery_images WHERE gallery_id = $1 ORDER BY sort_order ASC, id ASC",
        IMAGE_COLUMNS
    ))
    .bind(gallery_id)
    .fetch_all(pool)
    .await?)
}

async fn load_image_in_gallery(
    pool: &PgPool,
    image_id: Uuid,
    gallery_id: Uuid,
) -> Result<Option<GalleryImage>, AccessError> {
    Ok(sqlx::query_as::<_, GalleryImage>(&format!(
        "SELECT {} FROM gallery_images WHERE id = $1 AND gallery_id = $2",
        IMAGE_COLUMNS
    ))
    .bind(image_id)
    .bind(gallery_id)
    .fetch_optional(pool)
    .await?)
}

async fn load_favorite_images(
    pool: &PgPool,
    token_id: Uuid,
    gallery_id: Uuid,
) -> Result<Vec<GalleryImage>, AccessError> {
    Ok(sqlx::query_as::<_, GalleryImage>(&format!(
        r#"
        SELECT {}
        FROM gallery_images gi
        JOIN gallery_favorites f ON f.image_id = gi.id
        WHERE f.token_id = $1 AND gi.gallery_id = $2
        ORDER BY gi.sort_order ASC, gi.id ASC
        "#,
        IMAGE_COLUMNS
            .split(", ")
            .map(|c| format!("gi.{}", c))
            .collect::<Vec<_>>()
            .join(", ")
    ))
    .bind(token_id)
    .bind(gallery_id)
    .fetch_all(pool)
    .await?)
}

fn download_filename(image: &GalleryImage) -> String {
    image
        .filename
        .clone()
        .or_else(|| {
            image
                .storage_key
                .as_deref()
                .and_then(|k| k.rsplit('/').next())
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| format!("{}.jpg", image.id))
}

/// Storage keys for a set of images, failing closed if any image lacks one.
/// A gallery one image short reads as complete to the client, so the whole
/// load is refused instead.
fn require_storage_keys(images: &[GalleryImage]) -> Result<Vec<&str>, AccessError> {
    images
        .iter()
        .map(|img| match img.storage_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(AccessError::StorageInconsistent),
        })
        .collect()
}

/// Sign every image concurrently and attach favorite flags, preserving the
/// incoming order. Any single signing failure fails the whole batch.
async fn build_image_payloads(
    images: &[GalleryImage],
    favorites: &HashSet<Uuid>,
    issuer: &dyn SignedUrlIssuer,
) -> Result<Vec<ImagePayload>, AccessError> {
    let keys = require_storage_keys(images)?;

    // Gallery sizes reach tens of images; sequential signing would dominate
    // the read latency, so fan out.
    let signed = try_join_all(keys.iter().map(|key| issuer.issue_read_url(key))).await?;

    Ok(images
        .iter()
        .zip(signed)
        .map(|(image, signed)| ImagePayload {
            id: image.id,
            url: signed.url,
            url_expires_at: signed.expires_at,
            alt: image.alt.clone(),
            filename: image.filename.clone(),
            sort_order: image.sort_order,
            is_hero: image.is_hero,
            is_favorite: favorites.contains(&image.id),
        })
        .collect())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/client/gallery - Verify a code (or bound session) and load the
/// gallery with signed image URLs
pub async fn verify_and_load(
    cookies: Cookies,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<VerifyRequest>,
) -> Response {
    let code = payload
        .code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    // Nothing to authenticate with: no code in the body and no bound session.
    if code.is_none() && session::bound_token_id(&cookies).is_none() {
        return AccessError::NotFound.into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    let token = match resolve_credential(&pool, &cookies, code).await {
        Ok(token) => token,
        Err(e) => return e.into_response(),
    };

    let result: Result<GalleryResponse, AccessError> = async {
        let gallery = load_gallery(&pool, token.gallery_id).await?;
        let images = load_images(&pool, gallery.id).await?;
        let favorites = ledger::favorite_image_ids(&pool, token.id).await?;
        let issuer = signer()?;
        let images = build_image_payloads(&images, &favorites, issuer.as_ref()).await?;

        Ok(GalleryResponse {
            success: true,
            gallery: GalleryPayload {
                id: gallery.id,
                slug: gallery.slug,
                title: gallery.title,
                client_name: gallery.client_name,
                allow_download: token.allow_download,
                expires_at: token.expires_at,
                images,
            },
        })
    }
    .await;

    match result {
        Ok(response) => {
            // The fresh-code path binds the session so return visits skip the
            // code form; re-binding an existing session just refreshes it.
            session::bind(&cookies, token.id);

            let (ip, user_agent) = client_meta(&addr, &headers);
            ledger::log_action(&pool, token.id, "view", None, ip, user_agent).await;

            tracing::info!(token_id = %token.id, gallery_id = %token.gallery_id, "gallery viewed");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// POST /api/client/favorite - Toggle the favorite mark on one image
pub async fn toggle_favorite(
    cookies: Cookies,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<FavoriteRequest>,
) -> Response {
    let add = match payload.action.as_str() {
        "add" => true,
        "remove" => false,
        _ => return bad_request("Action must be \"add\" or \"remove\""),
    };

    if session::bound_token_id(&cookies).is_none() {
        return AccessError::NotFound.into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    let token = match resolve_credential(&pool, &cookies, None).await {
        Ok(token) => token,
        Err(e) => return e.into_response(),
    };

    // Cross-gallery image ids are rejected, never silently accepted.
    match load_image_in_gallery(&pool, payload.image_id, token.gallery_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return image_not_found(),
        Err(e) => return e.into_response(),
    }

    if let Err(e) =
        ledger::toggle_favorite(&pool, token.id, payload.image_id, add, payload.note).await
    {
        return AccessError::from(e).into_response();
    }

    // Logged per call, state change or not: the trail records intent.
    let action = if add { "favorite" } else { "unfavorite" };
    let (ip, user_agent) = client_meta(&addr, &headers);
    ledger::log_action(
        &pool,
        token.id,
        action,
        Some(payload.image_id),
        ip,
        user_agent,
    )
    .await;

    (
        StatusCode::OK,
        Json(FavoriteResponse {
            success: true,
            action: if add { "added" } else { "removed" }.to_string(),
        }),
    )
        .into_response()
}

/// POST /api/client/download - Request a signed download URL for one image
/// or for all favorited images
pub async fn request_download(
    cookies: Cookies,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<DownloadRequest>,
) -> Response {
    match payload.download_type.as_str() {
        ledger::DOWNLOAD_SINGLE => {
            if payload.image_id.is_none() {
                return bad_request("imageId is required for a single download");
            }
        }
        ledger::DOWNLOAD_FAVORITES => {}
        _ => return bad_request("Type must be \"single\" or \"favorites\""),
    }

    if session::bound_token_id(&cookies).is_none() {
        return AccessError::NotFound.into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    // Usability is re-checked here even though the session was already bound;
    // a token revoked mid-session must not keep downloading.
    let token = match resolve_credential(&pool, &cookies, None).await {
        Ok(token) => token,
        Err(e) => return e.into_response(),
    };

    if !token.allow_download {
        return AccessError::DownloadsDisabled.into_response();
    }

    // The quota counts download events: one click is one event whether it
    // fetched a single image or a whole favorites batch.
    let used = match ledger::download_count(&pool, token.id).await {
        Ok(used) => used,
        Err(e) => return AccessError::from(e).into_response(),
    };
    if ledger::quota_exhausted(token.max_downloads, used) {
        return AccessError::QuotaExceeded.into_response();
    }

    let issuer = match signer() {
        Ok(issuer) => issuer,
        Err(e) => return e.into_response(),
    };

    let (ip, user_agent) = client_meta(&addr, &headers);

    match payload.download_type.as_str() {
        ledger::DOWNLOAD_SINGLE => {
            // Already validated before credential resolution.
            let Some(image_id) = payload.image_id else {
                return bad_request("imageId is required for a single download");
            };

            let image = match load_image_in_gallery(&pool, image_id, token.gallery_id).await {
                Ok(Some(image)) => image,
                Ok(None) => return image_not_found(),
                Err(e) => return e.into_response(),
            };

            let result: Result<SingleDownloadResponse, AccessError> = async {
                let key = match image.storage_key.as_deref() {
                    Some(key) if !key.is_empty() => key,
                    _ => return Err(AccessError::StorageInconsistent),
                };
                let filename = download_filename(&image);
                let signed = issuer.issue_download_url(key, &filename).await?;

                ledger::record_download(&pool, token.id, Some(image.id), ledger::DOWNLOAD_SINGLE)
                    .await?;

                Ok(SingleDownloadResponse {
                    success: true,
                    download_url: signed.url,
                    filename,
                })
            }
            .await;

            match result {
                Ok(response) => {
                    ledger::log_action(
                        &pool,
                        token.id,
                        "download",
                        Some(image.id),
                        ip,
                        user_agent,
                    )
                    .await;
                    tracing::info!(token_id = %token.id, image_id = %image.id, "single download issued");
                    (StatusCode::OK, Json(response)).into_response()
                }
                Err(e) => e.into_response(),
            }
        }
        _ => {
            let images = match load_favorite_images(&pool, token.id, token.gallery_id).await {
                Ok(images) => images,
                Err(e) => return e.into_response(),
            };

            if images.is_empty() {
                return bad_request("No favorite images to download");
            }

            let result: Result<BatchDownloadResponse, AccessError> = async {
                let keys = require_storage_keys(&images)?;
                let filenames: Vec<String> = images.iter().map(download_filename).collect();

                let signed = try_join_all(
                    keys.iter()
                        .zip(filenames.iter())
                        .map(|(key, name)| issuer.issue_download_url(key, name)),
                )
                .await?;

                // One event row for the whole batch; the quota limits clicks,
                // not images.
                ledger::record_download(&pool, token.id, None, ledger::DOWNLOAD_FAVORITES).await?;

                let downloads: Vec<BatchDownloadItem> = images
                    .iter()
                    .zip(signed)
                    .zip(filenames)
                    .map(|((image, signed), filename)| BatchDownloadItem {
                        id: image.id,
                        url: signed.url,
                        filename,
                    })
                    .collect();

                Ok(BatchDownloadResponse {
                    success: true,
                    count: downloads.len(),
                    downloads,
                })
            }
            .await;

            match result {
                Ok(response) => {
                    ledger::log_action(&pool, token.id, "download", None, ip, user_agent).await;
                    tracing::info!(
                        token_id = %token.id,
                        count = response.count,
                        "favorites batch download issued"
                    );
                    (StatusCode::OK, Json(response)).into_response()
                }
                Err(e) => e.into_response(),
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::testing::MockIssuer;
    use axum::extract::connect_info::MockConnectInfo;
    use axum::{body::Body, http::Request, routing::post, Router};
    use tower::ServiceExt;
    use tower_cookies::CookieManagerLayer;

    fn client_router() -> Router {
        Router::new()
            .route("/api/client/gallery", post(verify_and_load))
            .route("/api/client/favorite", post(toggle_favorite))
            .route("/api/client/download", post(request_download))
            .layer(CookieManagerLayer::new())
            .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 12345))))
    }

    async fn post_json(
        app: Router,
        uri: &str,
        json: &impl serde::Serialize,
    ) -> (StatusCode, axum::body::Bytes) {
        let body = Body::from(serde_json::to_vec(json).unwrap());
        let req = Request::post(uri)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes)
    }

    fn image(sort_order: i32, storage_key: Option<&str>) -> GalleryImage {
        GalleryImage {
            id: Uuid::new_v4(),
            gallery_id: Uuid::new_v4(),
            storage_key: storage_key.map(|s| s.to_string()),
            url: None,
            thumb_url: None,
            full_url: None,
            alt: None,
            filename: Some(format!("img-{}.jpg", sort_order)),
            sort_order,
            is_hero: false,
        }
    }

    // ---- payload builder ----

    #[tokio::test]
    async fn test_build_payloads_signs_every_image_in_order() {
        let images = vec![
            image(1, Some("galleries/g1/a.jpg")),
            image(2, Some("galleries/g1/b.jpg")),
            image(3, Some("galleries/g1/c.jpg")),
        ];
        let issuer = MockIssuer::new();
        let payloads = build_image_payloads(&images, &HashSet::new(), &issuer)
            .await
            .unwrap();

        assert_eq!(payloads.len(), 3);
        let orders: Vec<i32> = payloads.iter().map(|p| p.sort_order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
        for (payload, img) in payloads.iter().zip(&images) {
            assert!(payload
                .url
                .contains(img.storage_key.as_deref().unwrap()));
            assert!(!payload.is_favorite);
        }
    }

    #[tokio::test]
    async fn test_build_payloads_marks_favorites() {
        let images = vec![
            image(1, Some("galleries/g1/a.jpg")),
            image(2, Some("galleries/g1/b.jpg")),
        ];
        let favorites: HashSet<Uuid> = [images[1].id].into_iter().collect();
        let issuer = MockIssuer::new();
        let payloads = build_image_payloads(&images, &favorites, &issuer)
            .await
            .unwrap();

        assert!(!payloads[0].is_favorite);
        assert!(payloads[1].is_favorite);
    }

    #[tokio::test]
    async fn test_build_payloads_fails_closed_on_missing_storage_key() {
        let images = vec![
            image(1, Some("galleries/g1/a.jpg")),
            image(2, None),
            image(3, Some("galleries/g1/c.jpg")),
        ];
        let issuer = MockIssuer::new();
        let result = build_image_payloads(&images, &HashSet::new(), &issuer).await;
        assert!(matches!(result, Err(AccessError::StorageInconsistent)));
    }

    #[tokio::test]
    async fn test_build_payloads_fails_closed_on_empty_storage_key() {
        let images = vec![image(1, Some(""))];
        let issuer = MockIssuer::new();
        let result = build_image_payloads(&images, &HashSet::new(), &issuer).await;
        assert!(matches!(result, Err(AccessError::StorageInconsistent)));
    }

    #[tokio::test]
    async fn test_build_payloads_one_signing_failure_fails_whole_load() {
        let images = vec![
            image(1, Some("galleries/g1/a.jpg")),
            image(2, Some("galleries/g1/b.jpg")),
        ];
        let issuer = MockIssuer::failing_on("galleries/g1/b.jpg");
        let result = build_image_payloads(&images, &HashSet::new(), &issuer).await;
        assert!(matches!(result, Err(AccessError::UpstreamSigning(_))));
    }

    // ---- helpers ----

    #[test]
    fn test_download_filename_prefers_stored_name() {
        let mut img = image(1, Some("galleries/g1/a.jpg"));
        assert_eq!(download_filename(&img), "img-1.jpg");

        img.filename = None;
        assert_eq!(download_filename(&img), "a.jpg");
    }

    #[test]
    fn test_require_storage_keys_accepts_complete_gallery() {
        let images = vec![image(1, Some("a.jpg")), image(2, Some("b.jpg"))];
        let keys = require_storage_keys(&images).unwrap();
        assert_eq!(keys, vec!["a.jpg", "b.jpg"]);
    }

    // ---- request validation (no database, no session) ----

    #[tokio::test]
    async fn test_verify_without_code_or_session_is_unauthorized() {
        let (status, _) = post_json(
            client_router(),
            "/api/client/gallery",
            &VerifyRequest { code: None },
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_verify_with_blank_code_is_unauthorized() {
        let (status, _) = post_json(
            client_router(),
            "/api/client/gallery",
            &VerifyRequest {
                code: Some("   ".to_string()),
            },
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_favorite_with_invalid_action_is_bad_request() {
        let (status, _) = post_json(
            client_router(),
            "/api/client/favorite",
            &FavoriteRequest {
                image_id: Uuid::new_v4(),
                action: "toggle".to_string(),
                note: None,
            },
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_favorite_without_session_is_unauthorized() {
        let (status, _) = post_json(
            client_router(),
            "/api/client/favorite",
            &FavoriteRequest {
                image_id: Uuid::new_v4(),
                action: "add".to_string(),
                note: None,
            },
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_download_with_invalid_type_is_bad_request() {
        let (status, _) = post_json(
            client_router(),
            "/api/client/download",
            &DownloadRequest {
                image_id: None,
                download_type: "zip".to_string(),
            },
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_single_download_without_image_id_is_bad_request() {
        let (status, _) = post_json(
            client_router(),
            "/api/client/download",
            &DownloadRequest {
                image_id: None,
                download_type: "single".to_string(),
            },
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_download_without_session_is_unauthorized() {
        let (status, _) = post_json(
            client_router(),
            "/api/client/download",
            &DownloadRequest {
                image_id: Some(Uuid::new_v4()),
                download_type: "single".to_string(),
            },
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
