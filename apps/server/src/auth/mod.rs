//! Authentication primitives: password hashing, session cookies and the
//! per-request [`SessionContext`].

mod extractor;

use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::{AppError, AppResult};
use crate::models::user::{OAUTH_PASSWORD_MARKER, SessionUser};

pub use extractor::{SessionContext, SessionProvider};

/// HttpOnly cookie holding the GitHub access token.
pub const GITHUB_TOKEN_COOKIE: &str = "github_token";
/// Client-readable session summary for GitHub logins.
pub const GITHUB_USER_COOKIE: &str = "github_user";
/// Client-readable session summary for local (email/password) logins.
pub const LOCAL_USER_COOKIE: &str = "sketchy_user";
/// Lifetime of every session cookie.
pub const SESSION_MAX_AGE_DAYS: i64 = 30;

/// Hash a password using Argon2id. Returns a PHC-format string.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a stored hash.
///
/// The OAuth marker and malformed hashes never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    if stored == OAUTH_PASSWORD_MARKER {
        return false;
    }

    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash could not be parsed: {}", e);
            false
        }
    }
}

/// Build a 30-day session cookie.
pub fn session_cookie(
    name: &'static str,
    value: String,
    http_only: bool,
    secure: bool,
) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);
    cookie.set_path("/");
    cookie.set_http_only(http_only);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(secure);
    cookie.set_max_age(CookieDuration::days(SESSION_MAX_AGE_DAYS));
    cookie
}

/// Build a cookie that removes `name` from the browser.
pub fn clear_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, "");
    cookie.set_path("/");
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(secure);
    cookie.make_removal();
    cookie
}

/// Serialize a session summary for a cookie value (percent-encoded JSON).
pub fn encode_session_user(user: &SessionUser) -> AppResult<String> {
    let json = serde_json::to_string(user)?;
    Ok(urlencoding::encode(&json).into_owned())
}

/// Parse a cookie value written by [`encode_session_user`].
pub fn decode_session_user(value: &str) -> Option<SessionUser> {
    let json = urlencoding::decode(value).ok()?;
    serde_json::from_str(&json).ok()
}
