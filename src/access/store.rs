//! Access token store: lookup, usability checks, and admin mutations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::code::verify_code;
use super::AccessError;
use crate::db::models::{AccessToken, NewAccessToken};

const TOKEN_COLUMNS: &str = "id, gallery_id, code_hash, code_salt, code_hint, label, \
     expires_at, is_active, allow_download, max_downloads, created_at";

/// Find the token a plaintext code belongs to.
///
/// There is no plaintext-indexable column, so this walks every issued token
/// and re-verifies the salted hash. Token counts here are admin-issued codes
/// (tens, not user-account millions), so the scan stays cheap.
pub async fn find_by_plaintext_code(
    pool: &PgPool,
    code: &str,
) -> Result<Option<AccessToken>, sqlx::Error> {
    let candidates = sqlx::query_as::<_, AccessToken>(&format!(
        "SELECT {} FROM access_tokens",
        TOKEN_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    for token in candidates {
        if verify_code(code, &token.code_hash, &token.code_salt) {
            return Ok(Some(token));
        }
    }

    Ok(None)
}

/// Direct lookup by id, used once a session is bound.
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<AccessToken>, sqlx::Error> {
    sqlx::query_as::<_, AccessToken>(&format!(
        "SELECT {} FROM access_tokens WHERE id = $1",
        TOKEN_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Usability check applied on every request, never cached at bind time.
///
/// Revocation is checked before expiry: an inactive token classifies as
/// `Revoked` even when it is also past `expires_at`.
pub fn ensure_usable(token: &AccessToken) -> Result<(), AccessError> {
    ensure_usable_at(token, Utc::now())
}

pub fn ensure_usable_at(token: &AccessToken, now: DateTime<Utc>) -> Result<(), AccessError> {
    if !token.is_active {
        return Err(AccessError::Revoked);
    }
    if let Some(expires_at) = token.expires_at {
        if expires_at <= now {
            return Err(AccessError::Expired);
        }
    }
    Ok(())
}

/// The usability invariant as a plain boolean, for admin display.
pub fn is_usable(token: &AccessToken) -> bool {
    ensure_usable(token).is_ok()
}

/// Insert a newly issued token. The hash/salt pair is written once and never
/// updated in place; reissuing a code means a new row.
pub async fn insert(pool: &PgPool, new: NewAccessToken) -> Result<AccessToken, sqlx::Error> {
    sqlx::query_as::<_, AccessToken>(&format!(
        r#"
        INSERT INTO access_tokens
            (gallery_id, code_hash, code_salt, code_hint, label, expires_at,
             allow_download, max_downloads)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {}
        "#,
        TOKEN_COLUMNS
    ))
    .bind(new.gallery_id)
    .bind(new.code_hash)
    .bind(new.code_salt)
    .bind(new.code_hint)
    .bind(new.label)
    .bind(new.expires_at)
    .bind(new.allow_download)
    .bind(new.max_downloads)
    .fetch_one(pool)
    .await
}

/// List issued tokens, optionally scoped to one gallery, newest first.
pub async fn list(
    pool: &PgPool,
    gallery_id: Option<Uuid>,
) -> Result<Vec<AccessToken>, sqlx::Error> {
    match gallery_id {
        Some(gallery_id) => {
            sqlx::query_as::<_, AccessToken>(&format!(
                "SELECT {} FROM access_tokens WHERE gallery_id = $1 ORDER BY created_at DESC",
                TOKEN_COLUMNS
            ))
            .bind(gallery_id)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, AccessToken>(&format!(
                "SELECT {} FROM access_tokens ORDER BY created_at DESC",
                TOKEN_COLUMNS
            ))
            .fetch_all(pool)
            .await
        }
    }
}

/// Soft-revoke: flips `is_active` off, leaving the row and its audit trail.
pub async fn revoke(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE access_tokens SET is_active = false WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Update the expiry window. `None` clears it (never expires).
pub async fn set_expiry(
    pool: &PgPool,
    id: Uuid,
    expires_at: Option<DateTime<Utc>>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE access_tokens SET expires_at = $2 WHERE id = $1")
        .bind(id)
        .bind(expires_at)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Revoke-and-remove: deletes the row, cascading the token's favorites,
/// downloads, and logs.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM access_tokens WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token(
        is_active: bool,
        expires_at: Option<DateTime<Utc>>,
    ) -> AccessToken {
        AccessToken {
            id: Uuid::new_v4(),
            gallery_id: Uuid::new_v4(),
            code_hash: "hash".to_string(),
            code_salt: "salt".to_string(),
            code_hint: "2025".to_string(),
            label: None,
            expires_at,
            is_active,
            allow_download: true,
            max_downloads: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_active_token_without_expiry_is_usable() {
        assert!(ensure_usable(&token(true, None)).is_ok());
    }

    #[test]
    fn test_active_token_with_future_expiry_is_usable() {
        let t = token(true, Some(Utc::now() + Duration::days(7)));
        assert!(ensure_usable(&t).is_ok());
    }

    #[test]
    fn test_expired_token_fails_with_expired() {
        let t = token(true, Some(Utc::now() - Duration::days(1)));
        assert!(matches!(ensure_usable(&t), Err(AccessError::Expired)));
    }

    #[test]
    fn test_revoked_token_fails_with_revoked_regardless_of_expiry() {
        let t = token(false, Some(Utc::now() + Duration::days(7)));
        assert!(matches!(ensure_usable(&t), Err(AccessError::Revoked)));

        // Revocation wins when the token is also expired.
        let t = token(false, Some(Utc::now() - Duration::days(1)));
        assert!(matches!(ensure_usable(&t), Err(AccessError::Revoked)));
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let now = Utc::now();
        let t = token(true, Some(now));
        assert!(matches!(
            ensure_usable_at(&t, now),
            Err(AccessError::Expired)
        ));

        let t = token(true, Some(now + Duration::seconds(1)));
        assert!(ensure_usable_at(&t, now).is_ok());
    }
}
