/**
 * Admin Access-Token Routes
 * Issue, list, revoke, and re-date client gallery access codes
 */
use axum::{
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::{code, store};
use crate::db::{self, models::NewAccessToken};
use crate::routes::ErrorResponse;

lazy_static::lazy_static! {
    /// Secret for validating the admin dashboard's bearer JWTs. The login
    /// flow that mints them lives in the external admin system.
    pub static ref ADMIN_JWT_SECRET: String = std::env::var("ADMIN_JWT_SECRET")
        .unwrap_or_else(|_| "default-admin-secret-change-in-production".to_string());
}

/// Claims carried by the admin dashboard's JWTs.
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminClaims {
    pub sub: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueTokenRequest {
    pub gallery_id: Uuid,
    /// Human-chosen code; generated when omitted.
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub allow_download: Option<bool>,
    #[serde(default)]
    pub max_downloads: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueTokenResponse {
    pub success: bool,
    /// The plaintext code, returned exactly once. Only the salted hash and
    /// the hint survive in the database.
    pub code: String,
    pub token: TokenSummary,
}

/// Admin-facing token view. Hash and salt never leave the database; the
/// hint is the only trace of the plaintext.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSummary {
    pub id: Uuid,
    pub gallery_id: Uuid,
    pub code_hint: String,
    pub label: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    /// The combined active + expiry state, so the dashboard shows at a
    /// glance whether the code still opens the gallery.
    pub is_usable: bool,
    pub allow_download: bool,
    pub max_downloads: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<crate::db::models::AccessToken> for TokenSummary {
    fn from(token: crate::db::models::AccessToken) -> Self {
        let is_usable = store::is_usable(&token);
        Self {
            id: token.id,
            gallery_id: token.gallery_id,
            code_hint: token.code_hint,
            label: token.label,
            expires_at: token.expires_at,
            is_active: token.is_active,
            is_usable,
            allow_download: token.allow_download,
            max_downloads: token.max_downloads,
            created_at: token.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTokensQuery {
    pub gallery_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTokensResponse {
    pub tokens: Vec<TokenSummary>,
    pub total: usize,
}

/// Body for PATCH /api/admin/access-tokens/{id}. Expiry is the only field
/// mutable in place besides the active flag; a new code means a new token.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExpiryRequest {
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

// ============================================================================
// Helper: Extract and verify admin bearer token
// ============================================================================

pub fn verify_admin_token(token: &str) -> Result<AdminClaims, jsonwebtoken::errors::Error> {
    let token_data = decode::<AdminClaims>(
        token,
        &DecodingKey::from_secret(ADMIN_JWT_SECRET.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

fn verify_auth(headers: &HeaderMap) -> Result<AdminClaims, (StatusCode, Json<ErrorResponse>)> {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match token {
        Some(t) => match verify_admin_token(t) {
            Ok(claims) => Ok(claims),
            Err(_) => Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Invalid or expired token".to_string(),
                    message: None,
                }),
            )),
        },
        None => Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Authorization required".to_string(),
                message: None,
            }),
        )),
    }
}

fn db_unavailable() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse {
            error: "Database not available".to_string(),
            message: None,
        }),
    )
}

fn db_error(e: sqlx::Error) -> (StatusCode, Json<ErrorResponse>) {
    tracing::error!("database error on admin token path: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Database error".to_string(),
            message: None,
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/admin/access-tokens - Issue a new access code for a gallery
pub async fn issue_token(
    headers: HeaderMap,
    Json(payload): Json<IssueTokenRequest>,
) -> impl IntoResponse {
    if let Err(err) = verify_auth(&headers) {
        return err.into_response();
    }

    // Accept a human-chosen code if it has a sane shape, else mint one.
    let plaintext = match payload.code {
        Some(ref chosen) => {
            let chosen = chosen.trim();
            if !code::is_valid_code(chosen) {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: "Code must be 6-64 letters, digits, or hyphens".to_string(),
                        message: None,
                    }),
                )
                    .into_response();
            }
            chosen.to_string()
        }
        None => code::generate_code(),
    };

    if let Some(max) = payload.max_downloads {
        if max < 0 {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "maxDownloads must not be negative".to_string(),
                    message: None,
                }),
            )
                .into_response();
        }
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    // The token row must point at a real gallery.
    let gallery_exists: Option<(Uuid,)> =
        match sqlx::query_as("SELECT id FROM galleries WHERE id = $1")
            .bind(payload.gallery_id)
            .fetch_optional(pool.as_ref())
            .await
        {
            Ok(row) => row,
            Err(e) => return db_error(e).into_response(),
        };
    if gallery_exists.is_none() {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Gallery not found".to_string(),
                message: None,
            }),
        )
            .into_response();
    }

    // Hash immediately; the plaintext is discarded after this response.
    let hashed = code::hash_code(&plaintext);

    let new_token = NewAccessToken {
        gallery_id: payload.gallery_id,
        code_hash: hashed.hash,
        code_salt: hashed.salt,
        code_hint: hashed.hint,
        label: payload.label,
        expires_at: payload.expires_at,
        allow_download: payload.allow_download.unwrap_or(false),
        max_downloads: payload.max_downloads,
    };

    match store::insert(&pool, new_token).await {
        Ok(token) => {
            tracing::info!(token_id = %token.id, gallery_id = %token.gallery_id, "access token issued");
            (
                StatusCode::CREATED,
                Json(IssueTokenResponse {
                    success: true,
                    code: plaintext,
                    token: token.into(),
                }),
            )
                .into_response()
        }
        Err(e) => db_error(e).into_response(),
    }
}

/// GET /api/admin/access-tokens - List issued tokens
pub async fn list_tokens(
    headers: HeaderMap,
    Query(query): Query<ListTokensQuery>,
) -> impl IntoResponse {
    if let Err(err) = verify_auth(&headers) {
        return err.into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    match store::list(&pool, query.gallery_id).await {
        Ok(tokens) => {
            let tokens: Vec<TokenSummary> = tokens.into_iter().map(Into::into).collect();
            let total = tokens.len();
            (StatusCode::OK, Json(ListTokensResponse { tokens, total })).into_response()
        }
        Err(e) => db_error(e).into_response(),
    }
}

/// POST /api/admin/access-tokens/{id}/revoke - Soft-revoke a token
pub async fn revoke_token(headers: HeaderMap, Path(id): Path<Uuid>) -> impl IntoResponse {
    if let Err(err) = verify_auth(&headers) {
        return err.into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    match store::revoke(&pool, id).await {
        Ok(true) => {
            tracing::info!(token_id = %id, "access token revoked");
            (StatusCode::OK, Json(SuccessResponse { success: true })).into_response()
        }
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Token not found".to_string(),
                message: None,
            }),
        )
            .into_response(),
        Err(e) => db_error(e).into_response(),
    }
}

/// PATCH /api/admin/access-tokens/{id} - Extend or clear the expiry window
pub async fn update_token_expiry(
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateExpiryRequest>,
) -> impl IntoResponse {
    if let Err(err) = verify_auth(&headers) {
        return err.into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    match store::set_expiry(&pool, id, payload.expires_at).await {
        Ok(true) => {
            tracing::info!(token_id = %id, expires_at = ?payload.expires_at, "access token expiry updated");
            (StatusCode::OK, Json(SuccessResponse { success: true })).into_response()
        }
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Token not found".to_string(),
                message: None,
            }),
        )
            .into_response(),
        Err(e) => db_error(e).into_response(),
    }
}

/// DELETE /api/admin/access-tokens/{id} - Revoke-and-remove a token and its
/// favorites, downloads, and logs
pub async fn delete_token(headers: HeaderMap, Path(id): Path<Uuid>) -> impl IntoResponse {
    if let Err(err) = verify_auth(&headers) {
        return err.into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    match store::delete(&pool, id).await {
        Ok(true) => {
            tracing::info!(token_id = %id, "access token deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Token not found".to_string(),
                message: None,
            }),
        )
            .into_response(),
        Err(e) => db_error(e).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::{get, patch, post};
    use axum::Router;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use tower::ServiceExt;

    fn admin_router() -> Router {
        Router::new()
            .route(
                "/api/admin/access-tokens",
                get(list_tokens).post(issue_token),
            )
            .route(
                "/api/admin/access-tokens/{id}",
                patch(update_token_expiry).delete(delete_token),
            )
            .route("/api/admin/access-tokens/{id}/revoke", post(revoke_token))
    }

    fn admin_bearer() -> String {
        let now = Utc::now().timestamp();
        let claims = AdminClaims {
            sub: "admin".to_string(),
            role: "ADMIN".to_string(),
            exp: now + 3600,
            iat: now,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(ADMIN_JWT_SECRET.as_bytes()),
        )
        .unwrap();
        format!("Bearer {}", token)
    }

    async fn send(
        app: Router,
        req: Request<Body>,
    ) -> (StatusCode, axum::body::Bytes) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes)
    }

    #[test]
    fn test_verify_admin_token_rejects_garbage() {
        assert!(verify_admin_token("not.a.jwt").is_err());
    }

    #[test]
    fn test_verify_admin_token_accepts_valid_jwt() {
        let bearer = admin_bearer();
        let token = bearer.strip_prefix("Bearer ").unwrap();
        let claims = verify_admin_token(token).unwrap();
        assert_eq!(claims.sub, "admin");
    }

    #[tokio::test]
    async fn test_list_without_bearer_is_unauthorized() {
        let req = Request::get("/api/admin/access-tokens")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(admin_router(), req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_issue_with_bad_bearer_is_unauthorized() {
        let body = serde_json::to_vec(&IssueTokenRequest {
            gallery_id: Uuid::new_v4(),
            code: None,
            label: None,
            expires_at: None,
            allow_download: None,
            max_downloads: None,
        })
        .unwrap();
        let req = Request::post("/api/admin/access-tokens")
            .header("authorization", "Bearer nope")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        let (status, _) = send(admin_router(), req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_issue_with_invalid_code_shape_is_bad_request() {
        let body = serde_json::to_vec(&IssueTokenRequest {
            gallery_id: Uuid::new_v4(),
            code: Some("bad code with spaces".to_string()),
            label: None,
            expires_at: None,
            allow_download: None,
            max_downloads: None,
        })
        .unwrap();
        let req = Request::post("/api/admin/access-tokens")
            .header("authorization", admin_bearer())
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        let (status, _) = send(admin_router(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_issue_with_negative_quota_is_bad_request() {
        let body = serde_json::to_vec(&IssueTokenRequest {
            gallery_id: Uuid::new_v4(),
            code: None,
            label: None,
            expires_at: None,
            allow_download: None,
            max_downloads: Some(-1),
        })
        .unwrap();
        let req = Request::post("/api/admin/access-tokens")
            .header("authorization", admin_bearer())
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        let (status, _) = send(admin_router(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_revoke_without_pool_is_service_unavailable() {
        let req = Request::post(format!(
            "/api/admin/access-tokens/{}/revoke",
            Uuid::new_v4()
        ))
        .header("authorization", admin_bearer())
        .body(Body::empty())
        .unwrap();
        let (status, _) = send(admin_router(), req).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_token_summary_hides_hash_and_salt() {
        let token = crate::db::models::AccessToken {
            id: Uuid::new_v4(),
            gallery_id: Uuid::new_v4(),
            code_hash: "secret-hash".to_string(),
            code_salt: "secret-salt".to_string(),
            code_hint: "2025".to_string(),
            label: Some("Wedding".to_string()),
            expires_at: None,
            is_active: true,
            allow_download: true,
            max_downloads: Some(3),
            created_at: Utc::now(),
        };
        let summary: TokenSummary = token.into();
        let json = serde_json::to_string(&summary).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(!json.contains("secret-salt"));
        assert!(json.contains("2025"));
    }
}
