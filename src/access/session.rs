//! Session binding for verified gallery visitors.
//!
//! After a code verifies, the browsing session is bound to the resolved
//! token through a pair of cookies so return visits skip re-entering the
//! code. The cookies are a thin pointer only: the token is re-fetched and
//! its usability re-checked on every request, so revoking or expiring a
//! token cuts off bound sessions immediately.

use sqlx::PgPool;
use time::Duration;
use tower_cookies::{
    cookie::SameSite,
    Cookie, Cookies,
};
use uuid::Uuid;

use crate::db::models::AccessToken;

/// Opaque "access granted" flag cookie.
pub const ACCESS_COOKIE: &str = "gallery_access";
/// Cookie holding the bound token id. Contains no secret beyond the opaque
/// id; the plaintext code and hash never reach the client.
pub const TOKEN_COOKIE: &str = "gallery_token";

const ACCESS_GRANTED: &str = "granted";
const SESSION_TTL_DAYS: i64 = 7;

fn secure_cookies() -> bool {
    std::env::var("ENVIRONMENT").unwrap_or_default() == "production"
}

fn session_cookie(name: &str, value: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(name.to_owned(), value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(secure_cookies());
    cookie.set_max_age(Duration::days(SESSION_TTL_DAYS));
    cookie
}

/// Bind the caller's session to a resolved token. Both cookies are set
/// together with identical lifetime and scope; setting one without the other
/// leaves the session unbound.
pub fn bind(cookies: &Cookies, token_id: Uuid) {
    cookies.add(session_cookie(ACCESS_COOKIE, ACCESS_GRANTED.to_string()));
    cookies.add(session_cookie(TOKEN_COOKIE, token_id.to_string()));
}

/// Drop the session binding. The cookies are the only session state, so
/// clearing them revokes visibility immediately.
pub fn clear(cookies: &Cookies) {
    for name in [ACCESS_COOKIE, TOKEN_COOKIE] {
        let mut cookie = Cookie::new(name, "");
        cookie.set_path("/");
        cookies.remove(cookie);
    }
}

/// The bound token id, if the session carries a complete, consistent binding.
/// A session with only one of the two cookies is treated as unbound.
pub fn bound_token_id(cookies: &Cookies) -> Option<Uuid> {
    let granted = cookies
        .get(ACCESS_COOKIE)
        .map(|c| c.value() == ACCESS_GRANTED)
        .unwrap_or(false);
    if !granted {
        return None;
    }
    cookies
        .get(TOKEN_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok())
}

/// Re-resolve a bound session to its token by id. Returns `None` when the
/// session is unbound or the token row is gone. Usability is NOT checked
/// here; the caller applies the same check as the fresh-code path so both
/// converge on one invariant.
pub async fn resolve(
    pool: &PgPool,
    cookies: &Cookies,
) -> Result<Option<AccessToken>, sqlx::Error> {
    let Some(token_id) = bound_token_id(cookies) else {
        return Ok(None);
    };
    super::store::find_by_id(pool, token_id).await
}
