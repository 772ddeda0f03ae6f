//! User models for local and GitHub OAuth authentication.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Password column value for accounts created through GitHub OAuth.
///
/// It is not a PHC string, so it can never verify against a submitted password.
pub const OAUTH_PASSWORD_MARKER: &str = "GITHUB_OAUTH_USER";

/// User stored in database.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password: String,
    pub avatar: Option<String>,
    pub is_email_verified: bool,
    pub verification_token: Option<String>,
    pub verification_token_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Account was created by the OAuth bridge and has no local password.
    pub fn is_oauth_only(&self) -> bool {
        self.password == OAUTH_PASSWORD_MARKER
    }
}

/// Public view of a user.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
    pub is_email_verified: bool,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id.to_string(),
            name: u.name,
            email: u.email,
            avatar: u.avatar,
            is_email_verified: u.is_email_verified,
        }
    }
}

/// Sign-up request body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Sign-up response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub message: String,
    pub needs_verification: bool,
    /// Whether the verification email was accepted by the provider.
    pub email_sent: bool,
}

/// Local login request body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Local login response.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub user: UserResponse,
}

/// Resend-verification request body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ResendVerificationRequest {
    #[serde(default)]
    pub email: String,
}

/// Verify-email query string.
#[derive(Debug, Deserialize)]
pub struct VerifyEmailQuery {
    pub token: Option<String>,
}

/// Generic `{ message }` response.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// GitHub user info from API.
#[derive(Debug, Deserialize)]
pub struct GitHubUserInfo {
    pub id: i64,
    pub login: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub email: Option<String>,
}

/// One entry of `GET /user/emails`.
#[derive(Debug, Deserialize)]
pub struct GitHubEmail {
    pub email: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub verified: bool,
}

/// Client-readable session summary stored in the `github_user` / `sketchy_user` cookies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SessionUser {
    /// Local user id, or the GitHub numeric id when no local record exists.
    pub id: String,
    pub login: String,
    pub name: String,
    /// Resolved email; falls back to the GitHub login when none resolves.
    pub email: String,
    pub avatar_url: Option<String>,
}
