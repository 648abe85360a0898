//! Favorite marks, download events, and the append-only access log.
//!
//! Favorites are scoped to the token, not a client identity: two codes for
//! the same gallery keep separate favorite sets. Download quota is counted
//! from the event rows on every check rather than kept as a mutable counter,
//! so concurrent downloads cannot lose updates.

use std::collections::HashSet;

use sqlx::PgPool;
use uuid::Uuid;

/// Download event kinds.
pub const DOWNLOAD_SINGLE: &str = "single";
pub const DOWNLOAD_FAVORITES: &str = "favorites";

/// Image ids favorited by this token.
pub async fn favorite_image_ids(
    pool: &PgPool,
    token_id: Uuid,
) -> Result<HashSet<Uuid>, sqlx::Error> {
    let rows: Vec<(Uuid,)> =
        sqlx::query_as("SELECT image_id FROM gallery_favorites WHERE token_id = $1")
            .bind(token_id)
            .fetch_all(pool)
            .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Toggle the favorite mark for one image.
///
/// Adding is an upsert on the (token_id, image_id) pair, so a repeated "add"
/// is a no-op (the unique constraint is the race enforcement point, not any
/// application lock). Removing a mark that does not exist is equally a no-op.
pub async fn toggle_favorite(
    pool: &PgPool,
    token_id: Uuid,
    image_id: Uuid,
    add: bool,
    note: Option<String>,
) -> Result<(), sqlx::Error> {
    if add {
        sqlx::query(
            r#"
            INSERT INTO gallery_favorites (token_id, image_id, note)
            VALUES ($1, $2, $3)
            ON CONFLICT (token_id, image_id) DO UPDATE SET note = EXCLUDED.note
            "#,
        )
        .bind(token_id)
        .bind(image_id)
        .bind(note)
        .execute(pool)
        .await?;
    } else {
        sqlx::query("DELETE FROM gallery_favorites WHERE token_id = $1 AND image_id = $2")
            .bind(token_id)
            .bind(image_id)
            .execute(pool)
            .await?;
    }
    Ok(())
}

/// Download events recorded for this token. One favorites-batch download is
/// one event regardless of how many images it contained.
pub async fn download_count(pool: &PgPool, token_id: Uuid) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM gallery_downloads WHERE token_id = $1")
            .bind(token_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

/// Whether the quota is already used up. `None` means unlimited.
pub fn quota_exhausted(max_downloads: Option<i32>, used: i64) -> bool {
    matches!(max_downloads, Some(max) if used >= max as i64)
}

/// Append one download event row. Called exactly once per successful
/// download request, single or batch.
pub async fn record_download(
    pool: &PgPool,
    token_id: Uuid,
    image_id: Option<Uuid>,
    download_type: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO gallery_downloads (token_id, image_id, download_type) VALUES ($1, $2, $3)",
    )
    .bind(token_id)
    .bind(image_id)
    .bind(download_type)
    .execute(pool)
    .await?;
    Ok(())
}

/// Best-effort audit append. The log records intent, not state transitions,
/// so every user action gets a row even when the resulting state did not
/// change. A failed write must never fail the primary action; it is only
/// surfaced to operational logging.
pub async fn log_action(
    pool: &PgPool,
    token_id: Uuid,
    action: &str,
    image_id: Option<Uuid>,
    ip: Option<String>,
    user_agent: Option<String>,
) {
    let result = sqlx::query(
        r#"
        INSERT INTO gallery_access_logs (token_id, action, image_id, ip, user_agent)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(token_id)
    .bind(action)
    .bind(image_id)
    .bind(ip)
    .bind(user_agent)
    .execute(pool)
    .await;

    if let Err(e) = result {
        tracing::warn!(
            token_id = %token_id,
            action = action,
            "failed to write gallery access log: {}",
            e
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_unlimited_when_none() {
        assert!(!quota_exhausted(None, 0));
        assert!(!quota_exhausted(None, 10_000));
    }

    #[test]
    fn test_quota_exhausted_at_limit() {
        assert!(!quota_exhausted(Some(2), 0));
        assert!(!quota_exhausted(Some(2), 1));
        assert!(quota_exhausted(Some(2), 2));
        assert!(quota_exhausted(Some(2), 3));
    }

    #[test]
    fn test_quota_zero_blocks_all_downloads() {
        assert!(quota_exhausted(Some(0), 0));
    }
}
