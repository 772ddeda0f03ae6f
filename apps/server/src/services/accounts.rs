//! Local (email + password) accounts and session endpoints.
//!
//! Endpoints:
//! 1. POST /auth/signup: Create an unverified account and email a verification link
//! 2. POST /auth/login: Check credentials, set the `sketchy_user` summary cookie
//! 3. POST /auth/logout: Clear every session cookie
//! 4. GET /auth/session: Return the session derived from cookies

use actix_web::{HttpResponse, web};
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::auth::{
    self, GITHUB_TOKEN_COOKIE, GITHUB_USER_COOKIE, LOCAL_USER_COOKIE, SessionContext,
    SessionProvider,
};
use crate::config::Config;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{
    LoginRequest, LoginResponse, MessageResponse, SessionUser, SignupRequest, SignupResponse,
    UserResponse,
};
use crate::services::email::EmailDispatcher;
use crate::services::verification;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Configure account routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/auth/signup").route(web::post().to(signup)))
        .service(web::resource("/auth/login").route(web::post().to(login)))
        .service(web::resource("/auth/logout").route(web::post().to(logout)))
        .service(web::resource("/auth/session").route(web::get().to(session)));
}

/// Response for `GET /auth/session`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub user: Option<SessionUser>,
    pub provider: Option<SessionProvider>,
}

fn validate_signup(req: &SignupRequest) -> AppResult<()> {
    if req.name.trim().is_empty() || req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::InvalidInput(
            "Name, email and password are required".to_string(),
        ));
    }
    if !req.email.contains('@') {
        return Err(AppError::InvalidInput("Email address is invalid".to_string()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidInput(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Create a local account.
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "Auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created, verification pending", body = SignupResponse),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::error::ErrorResponse),
    )
)]
pub async fn signup(
    pool: web::Data<DbPool>,
    dispatcher: web::Data<EmailDispatcher>,
    body: web::Json<SignupRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    validate_signup(&req)?;

    if crate::db::users::find_by_email(pool.connection(), &req.email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "An account with this email already exists".to_string(),
        ));
    }

    let password_hash = auth::hash_password(&req.password)?;
    let user = crate::db::users::create_local(
        pool.connection(),
        req.name.trim(),
        &req.email,
        &password_hash,
    )
    .await?;

    info!(user_id = %user.id, "Local account created");

    let outcome = verification::issue(pool.get_ref(), dispatcher.get_ref(), &user).await?;

    Ok(HttpResponse::Created().json(SignupResponse {
        message: "Account created. Please check your email to verify your account.".to_string(),
        needs_verification: true,
        email_sent: outcome.success,
    }))
}

/// Log in with email and password.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse),
        (status = 403, description = "Email not verified", body = crate::error::ErrorResponse),
    )
)]
pub async fn login(
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::InvalidInput(
            "Email and password are required".to_string(),
        ));
    }

    let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

    let user = crate::db::users::find_by_email(pool.connection(), &req.email)
        .await?
        .ok_or_else(invalid)?;

    if !auth::verify_password(&req.password, &user.password) {
        if user.is_oauth_only() {
            warn!(user_id = %user.id, "Password login attempted on a GitHub-only account");
        }
        return Err(invalid());
    }

    if !user.is_email_verified {
        return Err(AppError::EmailNotVerified);
    }

    let summary = SessionUser {
        id: user.id.to_string(),
        login: user.email.clone(),
        name: user.name.clone(),
        email: user.email.clone(),
        avatar_url: user.avatar.clone(),
    };
    let cookie = auth::session_cookie(
        LOCAL_USER_COOKIE,
        auth::encode_session_user(&summary)?,
        false,
        config.environment.is_production(),
    );

    info!(user_id = %user.id, "Local login");

    Ok(HttpResponse::Ok().cookie(cookie).json(LoginResponse {
        user: UserResponse::from(user),
    }))
}

/// Clear every session cookie.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
    )
)]
pub async fn logout(config: web::Data<Config>) -> HttpResponse {
    let secure = config.environment.is_production();

    HttpResponse::Ok()
        .cookie(auth::clear_cookie(GITHUB_TOKEN_COOKIE, secure))
        .cookie(auth::clear_cookie(GITHUB_USER_COOKIE, secure))
        .cookie(auth::clear_cookie(LOCAL_USER_COOKIE, secure))
        .json(MessageResponse::new("Logged out"))
}

/// Return the session derived from the request cookies.
#[utoipa::path(
    get,
    path = "/api/auth/session",
    tag = "Auth",
    responses(
        (status = 200, description = "Current session (user is null when anonymous)", body = SessionResponse),
    )
)]
pub async fn session(session: SessionContext) -> HttpResponse {
    HttpResponse::Ok().json(SessionResponse {
        user: session.user().cloned(),
        provider: session.provider(),
    })
}
