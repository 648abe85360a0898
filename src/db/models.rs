//! Database Models - structs representing database tables (used by sqlx/serde).
#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Gallery model. Galleries themselves are owned by the external admin CRUD
/// surface; this service only reads them on the gated path.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gallery {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub client_name: Option<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One image in a gallery. `storage_key` points into the private bucket and
/// is required for token-gated access; the url fields are legacy public
/// fallbacks used only by the marketing pages.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImage {
    pub id: Uuid,
    pub gallery_id: Uuid,
    pub storage_key: Option<String>,
    pub url: Option<String>,
    pub thumb_url: Option<String>,
    pub full_url: Option<String>,
    pub alt: Option<String>,
    pub filename: Option<String>,
    pub sort_order: i32,
    pub is_hero: bool,
}

/// Access token model. The plaintext code is hashed at creation and never
/// stored; `code_hint` keeps only the last few characters for admin display.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
    pub id: Uuid,
    pub gallery_id: Uuid,
    #[serde(skip_serializing)]
    pub code_hash: String,
    #[serde(skip_serializing)]
    pub code_salt: String,
    pub code_hint: String,
    pub label: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub allow_download: bool,
    pub max_downloads: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// New access token for insertion
#[derive(Debug, Clone)]
pub struct NewAccessToken {
    pub gallery_id: Uuid,
    pub code_hash: String,
    pub code_salt: String,
    pub code_hint: String,
    pub label: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub allow_download: bool,
    pub max_downloads: Option<i32>,
}

/// Per-token favorite mark on one image, unique per (token_id, image_id).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryFavorite {
    pub id: Uuid,
    pub token_id: Uuid,
    pub image_id: Uuid,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Append-only audit row for view/favorite/unfavorite/download actions.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryAccessLog {
    pub id: Uuid,
    pub token_id: Uuid,
    pub action: String,
    pub image_id: Option<Uuid>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Append-only download event. Quota enforcement counts these rows rather
/// than maintaining a running counter, so the count never drifts from the log.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryDownload {
    pub id: Uuid,
    pub token_id: Uuid,
    pub image_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub download_type: String,
    pub created_at: DateTime<Utc>,
}
