//! Email verification tokens: issuing, redeeming and resending.
//!
//! Endpoints:
//! 1. GET /auth/verify-email?token=...: Redeem a token
//! 2. POST /auth/resend-verification: Issue a fresh token for an unverified account

use actix_web::{HttpResponse, web};
use chrono::{Duration, Utc};
use tracing::{info, warn};

use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{MessageResponse, ResendVerificationRequest, User, VerifyEmailQuery};
use crate::services::email::{EmailDispatcher, EmailOutcome};

/// Tokens are valid for 24 hours after issuance.
pub const TOKEN_TTL_HOURS: i64 = 24;

/// Response for an unknown email, identical to a successful resend in status.
pub const RESEND_GENERIC_MESSAGE: &str =
    "If this email is registered, a verification link has been sent.";

/// Configure verification routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/auth/verify-email").route(web::get().to(verify_email)))
        .service(
            web::resource("/auth/resend-verification").route(web::post().to(resend_verification)),
        );
}

/// Generate a 256-bit random token, hex-encoded.
pub fn generate_token() -> String {
    let random_bytes: [u8; 32] = rand::random();
    hex::encode(random_bytes)
}

/// Store a fresh token on `user` and email the verification link.
///
/// The token is persisted before sending; a failed send is reported in the
/// outcome and does not fail this call.
pub async fn issue(pool: &DbPool, dispatcher: &EmailDispatcher, user: &User) -> AppResult<EmailOutcome> {
    let token = generate_token();
    let expires_at = Utc::now() + Duration::hours(TOKEN_TTL_HOURS);

    crate::db::users::set_verification_token(pool.connection(), user.id, &token, expires_at).await?;

    info!(user_id = %user.id, "Verification token issued");

    Ok(dispatcher
        .send_verification_email(&user.email, &token, &user.name)
        .await)
}

/// Redeem a verification token.
///
/// Unknown and expired tokens both yield `AppError::InvalidOrExpiredToken`.
pub async fn redeem(pool: &DbPool, token: &str) -> AppResult<User> {
    let user = crate::db::users::find_by_valid_token(pool.connection(), token, Utc::now())
        .await?
        .ok_or(AppError::InvalidOrExpiredToken)?;

    let verified = crate::db::users::mark_verified(pool.connection(), user.id).await?;
    info!(user_id = %verified.id, "Email verified");

    Ok(verified)
}

// ============================================================================
// Endpoints
// ============================================================================

/// Verify an email address.
#[utoipa::path(
    get,
    path = "/api/auth/verify-email",
    tag = "Auth",
    params(
        ("token" = String, Query, description = "Verification token from the email link")
    ),
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "Missing, invalid or expired token", body = crate::error::ErrorResponse),
    )
)]
pub async fn verify_email(
    pool: web::Data<DbPool>,
    query: web::Query<VerifyEmailQuery>,
) -> AppResult<HttpResponse> {
    let token = query
        .token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::InvalidInput("Verification token is required".to_string()))?;

    redeem(pool.get_ref(), token).await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Email verified successfully")))
}

/// Resend the verification email.
#[utoipa::path(
    post,
    path = "/api/auth/resend-verification",
    tag = "Auth",
    request_body = ResendVerificationRequest,
    responses(
        (status = 200, description = "Generic acknowledgement", body = MessageResponse),
        (status = 400, description = "Missing email or already verified", body = crate::error::ErrorResponse),
    )
)]
pub async fn resend_verification(
    pool: web::Data<DbPool>,
    dispatcher: web::Data<EmailDispatcher>,
    body: web::Json<ResendVerificationRequest>,
) -> AppResult<HttpResponse> {
    let email = body.into_inner().email;
    if email.trim().is_empty() {
        return Err(AppError::InvalidInput("Email is required".to_string()));
    }

    let Some(user) = crate::db::users::find_by_email(pool.connection(), &email).await? else {
        return Ok(HttpResponse::Ok().json(MessageResponse::new(RESEND_GENERIC_MESSAGE)));
    };

    if user.is_email_verified {
        return Err(AppError::InvalidInput(
            "Email is already verified. Please log in.".to_string(),
        ));
    }

    let outcome = issue(pool.get_ref(), dispatcher.get_ref(), &user).await?;
    if !outcome.success {
        warn!(user_id = %user.id, "Resend stored a new token but the email was not delivered");
    }

    Ok(HttpResponse::Ok().json(MessageResponse::new(
        "Verification email resent successfully",
    )))
}
