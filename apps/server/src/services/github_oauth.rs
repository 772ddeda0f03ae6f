//! GitHub OAuth routes for web UI authentication.
//!
//! The GitHub access token itself is the session credential:
//! - `github_token`: HttpOnly cookie holding the provider token (30 days)
//! - `github_user`: client-readable JSON summary of the signed-in user (30 days)
//!
//! Endpoints:
//! 1. GET /auth/github: Redirect to GitHub's authorize page
//! 2. GET /auth/github/callback: Exchange code, resolve email, upsert user, set cookies
//!
//! The callback never surfaces a raw failure to the browser: after the request
//! has been validated, every error becomes a redirect carrying an error tag.

use actix_web::{HttpResponse, web};
use secrecy::{ExposeSecret, SecretString};
use tracing::{error, info, warn};

use crate::auth::{self, GITHUB_TOKEN_COOKIE, GITHUB_USER_COOKIE};
use crate::config::{Config, GitHubOAuthSettings};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{GitHubEmail, GitHubUserInfo, SessionUser};

/// HTTP connect timeout for GitHub API calls.
const HTTP_CONNECT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);
/// HTTP total timeout for GitHub API calls.
const HTTP_REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);
/// Scopes requested on the authorize redirect.
const OAUTH_SCOPE: &str = "read:user user:email";
const USER_AGENT: &str = "sketchy";

/// GitHub reported an error on the authorize step.
pub const ERROR_AUTH_FAILED: &str = "github_auth_failed";
/// GitHub refused to exchange the code for a token.
pub const ERROR_TOKEN_FAILED: &str = "github_token_failed";
/// Anything else went wrong during the callback.
pub const ERROR_AUTH_ERROR: &str = "github_auth_error";

/// Configure OAuth routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/auth/github").route(web::get().to(github_login)))
        .service(web::resource("/auth/github/callback").route(web::get().to(github_callback)));
}

/// Build an HTTP client with timeouts.
fn build_http_client() -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(HTTP_CONNECT_TIMEOUT)
        .timeout(HTTP_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))
}

fn redirect(location: String) -> HttpResponse {
    HttpResponse::Found()
        .append_header(("Location", location))
        .finish()
}

fn redirect_with_error(app_url: &str, tag: &str) -> HttpResponse {
    redirect(format!("{}/?error={}", app_url, tag))
}

// ============================================================================
// Endpoints
// ============================================================================

/// Redirect to GitHub OAuth authorization page.
#[utoipa::path(
    get,
    path = "/api/auth/github",
    tag = "Auth",
    responses(
        (status = 302, description = "Redirect to GitHub"),
        (status = 500, description = "GitHub OAuth not configured", body = crate::error::ErrorResponse),
    )
)]
pub async fn github_login(config: web::Data<Config>) -> AppResult<HttpResponse> {
    let oauth = &config.github_oauth;
    let client_id = oauth
        .client_id
        .as_deref()
        .filter(|_| oauth.is_configured())
        .ok_or_else(|| AppError::Configuration("GitHub OAuth not configured".to_string()))?;

    let mut authorize_url = format!(
        "{}/login/oauth/authorize?client_id={}&scope={}",
        oauth.oauth_base_url,
        urlencoding::encode(client_id),
        urlencoding::encode(OAUTH_SCOPE),
    );
    if let Some(redirect_uri) = oauth.redirect_url.as_deref() {
        authorize_url.push_str("&redirect_uri=");
        authorize_url.push_str(&urlencoding::encode(redirect_uri));
    }

    Ok(redirect(authorize_url))
}

/// Handle GitHub OAuth callback.
#[utoipa::path(
    get,
    path = "/api/auth/github/callback",
    tag = "Auth",
    params(
        ("code" = Option<String>, Query, description = "Authorization code from GitHub"),
        ("error" = Option<String>, Query, description = "Error reported by GitHub")
    ),
    responses(
        (status = 302, description = "Redirect to the app, with `?error=` on failure"),
        (status = 400, description = "No code provided", body = crate::error::ErrorResponse),
        (status = 500, description = "GitHub OAuth not configured", body = crate::error::ErrorResponse),
    )
)]
pub async fn github_callback(
    query: web::Query<CallbackQuery>,
    config: web::Data<Config>,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();

    if let Some(ref err) = query.error {
        warn!("GitHub OAuth error: {}", err);
        return Ok(redirect_with_error(&config.app_url, ERROR_AUTH_FAILED));
    }

    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::InvalidInput("No code provided".to_string()))?;

    if !config.github_oauth.is_configured() {
        return Err(AppError::Configuration(
            "GitHub OAuth not configured".to_string(),
        ));
    }

    match complete_login(&code, &config, pool.get_ref()).await {
        Ok(response) => Ok(response),
        Err(CallbackError::TokenRejected(reason)) => {
            warn!("GitHub token exchange error: {}", reason);
            Ok(redirect_with_error(&config.app_url, ERROR_TOKEN_FAILED))
        }
        Err(CallbackError::Failed(e)) => {
            error!("GitHub OAuth callback error: {}", e);
            Ok(redirect_with_error(&config.app_url, ERROR_AUTH_ERROR))
        }
    }
}

/// Run the callback from token exchange to session cookies.
async fn complete_login(
    code: &str,
    config: &Config,
    pool: &DbPool,
) -> Result<HttpResponse, CallbackError> {
    let github = GitHubClient::new(&config.github_oauth)?;

    // --- Exchange code for access token ---
    let access_token = github.exchange_code(code).await?;

    // --- Fetch profile, then emails only if the profile hides them ---
    let profile = github.fetch_user(&access_token).await?;
    let email = match profile.email.clone().filter(|e| !e.is_empty()) {
        Some(email) => Some(email),
        None => github.fetch_primary_email(&access_token).await?,
    };

    let display_name = profile
        .name
        .clone()
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| profile.login.clone());

    // --- Upsert user keyed on email ---
    let local_user = match email.as_deref() {
        Some(email) => {
            let upsert = crate::db::users::upsert_from_github(
                pool.connection(),
                email,
                &display_name,
                profile.avatar_url.as_deref(),
            )
            .await?;
            info!(
                user_id = %upsert.user.id,
                login = %profile.login,
                created = upsert.created,
                "GitHub OAuth login"
            );
            Some(upsert.user)
        }
        None => {
            warn!(login = %profile.login, "GitHub OAuth login without a resolvable email");
            None
        }
    };

    // --- Session cookies ---
    let summary = SessionUser {
        id: local_user
            .as_ref()
            .map(|u| u.id.to_string())
            .unwrap_or_else(|| profile.id.to_string()),
        login: profile.login.clone(),
        name: local_user
            .as_ref()
            .map(|u| u.name.clone())
            .unwrap_or(display_name),
        email: email.unwrap_or_else(|| profile.login.clone()),
        avatar_url: profile.avatar_url.clone(),
    };

    let secure = config.environment.is_production();
    let token_cookie = auth::session_cookie(
        GITHUB_TOKEN_COOKIE,
        access_token.expose_secret().to_string(),
        true,
        secure,
    );
    let user_cookie = auth::session_cookie(
        GITHUB_USER_COOKIE,
        auth::encode_session_user(&summary)?,
        false,
        secure,
    );

    Ok(HttpResponse::Found()
        .cookie(token_cookie)
        .cookie(user_cookie)
        .append_header(("Location", format!("{}/", config.app_url)))
        .finish())
}

// ============================================================================
// GitHub API client
// ============================================================================

/// Thin client over the three GitHub calls the callback needs.
struct GitHubClient<'a> {
    http: reqwest::Client,
    settings: &'a GitHubOAuthSettings,
}

impl<'a> GitHubClient<'a> {
    fn new(settings: &'a GitHubOAuthSettings) -> AppResult<Self> {
        Ok(Self {
            http: build_http_client()?,
            settings,
        })
    }

    async fn exchange_code(&self, code: &str) -> Result<SecretString, CallbackError> {
        let client_id = self.settings.client_id.as_deref().unwrap_or_default();
        let client_secret = self
            .settings
            .client_secret
            .as_ref()
            .map(|s| s.expose_secret())
            .unwrap_or_default();

        let token_response: TokenResponse = self
            .http
            .post(format!("{}/login/oauth/access_token", self.settings.oauth_base_url))
            .header("Accept", "application/json")
            .json(&serde_json::json!({
                "client_id": client_id,
                "client_secret": client_secret,
                "code": code,
            }))
            .send()
            .await
            .map_err(AppError::from)?
            .json()
            .await
            .map_err(AppError::from)?;

        if let Some(err) = token_response.error {
            let description = token_response.error_description.unwrap_or_default();
            return Err(CallbackError::TokenRejected(format!("{} {}", err, description)));
        }

        token_response
            .access_token
            .filter(|t| !t.is_empty())
            .map(SecretString::from)
            .ok_or_else(|| CallbackError::TokenRejected("no access_token in response".to_string()))
    }

    async fn fetch_user(&self, token: &SecretString) -> Result<GitHubUserInfo, CallbackError> {
        let user = self
            .authorized_get("/user", token)
            .await?
            .json()
            .await
            .map_err(AppError::from)?;
        Ok(user)
    }

    /// First address flagged both primary and verified, if any.
    async fn fetch_primary_email(&self, token: &SecretString) -> Result<Option<String>, CallbackError> {
        let emails: Vec<GitHubEmail> = self
            .authorized_get("/user/emails", token)
            .await?
            .json()
            .await
            .map_err(AppError::from)?;

        Ok(select_primary_email(emails))
    }

    async fn authorized_get(
        &self,
        path: &str,
        token: &SecretString,
    ) -> Result<reqwest::Response, CallbackError> {
        let response = self
            .http
            .get(format!("{}{}", self.settings.api_base_url, path))
            .header("Authorization", format!("Bearer {}", token.expose_secret()))
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(AppError::from)?
            .error_for_status()
            .map_err(AppError::from)?;
        Ok(response)
    }
}

fn select_primary_email(emails: Vec<GitHubEmail>) -> Option<String> {
    emails
        .into_iter()
        .find(|e| e.primary && e.verified)
        .map(|e| e.email)
}

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, serde::Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}

#[derive(serde::Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Callback failures, split by the redirect tag they map to.
#[derive(Debug, thiserror::Error)]
enum CallbackError {
    #[error("token exchange rejected: {0}")]
    TokenRejected(String),

    #[error(transparent)]
    Failed(#[from] AppError),
}
