//! Email verification: redeeming tokens and resending links.

use actix_web::test;
use chrono::{Duration, Utc};
use serde_json::json;
use sketchy_lib::db::users;

use super::mock_providers::MockResend;
use super::test_helpers::*;

/// Sign-up stores a token; redeeming it verifies and clears it; a second redeem fails.
#[actix_rt::test]
async fn test_token_redeems_once() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool, test_config()).await;

    let (status, body) = signup(&app, "Ada", "ada@example.com", "secret123").await;
    assert_eq!(status, 201, "signup failed: {:?}", body);

    let user = users::find_by_email(pool.connection(), "ada@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(!user.is_email_verified);
    assert!(user.verification_token_expiry.is_some());
    let token = user.verification_token.expect("token should be stored");

    let uri = format!("/api/auth/verify-email?token={}", token);
    let (status, body) = get_json(&app, &uri).await;
    assert_eq!(status, 200, "verify failed: {:?}", body);
    assert_eq!(body["message"], "Email verified successfully");

    let user = users::find_by_email(pool.connection(), "ada@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(user.is_email_verified);
    assert!(user.verification_token.is_none());
    assert!(user.verification_token_expiry.is_none());

    let (status, body) = get_json(&app, &uri).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "INVALID_OR_EXPIRED_TOKEN");
}

/// An expired token is answered exactly like an unknown one.
#[actix_rt::test]
async fn test_expired_token_matches_unknown_token() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool, test_config()).await;

    signup(&app, "Bob", "bob@example.com", "secret123").await;
    let user = users::find_by_email(pool.connection(), "bob@example.com")
        .await
        .unwrap()
        .unwrap();
    users::set_verification_token(
        pool.connection(),
        user.id,
        "expired-token",
        Utc::now() - Duration::minutes(1),
    )
    .await
    .unwrap();

    let (expired_status, expired_body) =
        get_json(&app, "/api/auth/verify-email?token=expired-token").await;
    let (unknown_status, unknown_body) =
        get_json(&app, "/api/auth/verify-email?token=never-issued").await;

    assert_eq!(expired_status, 400);
    assert_eq!(expired_status, unknown_status);
    assert_eq!(expired_body, unknown_body);

    let user = users::find_by_id(pool.connection(), user.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!user.is_email_verified);
}

#[actix_rt::test]
async fn test_missing_token_is_rejected() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool, test_config()).await;

    let (status, body) = get_json(&app, "/api/auth/verify-email").await;
    assert_eq!(status, 400);
    assert_eq!(body["message"], "Verification token is required");

    let (status, _) = get_json(&app, "/api/auth/verify-email?token=").await;
    assert_eq!(status, 400);
}

/// Sign-up emails a link that carries the stored token.
#[actix_rt::test]
async fn test_signup_sends_verification_link() {
    let resend = MockResend::start();
    let pool = create_test_pool().await;
    let mut config = test_config();
    config.email.base_url = resend.base_url.clone();
    let app = create_test_app(&pool, config).await;

    let (status, body) = signup(&app, "Cy", "cy@example.com", "secret123").await;
    assert_eq!(status, 201);
    assert_eq!(body["needsVerification"], true);
    assert_eq!(body["emailSent"], true);

    let token = stored_token(&pool, "cy@example.com").await.unwrap();
    let sent = resend.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["to"], json!(["cy@example.com"]));
    let html = sent[0]["html"].as_str().unwrap();
    assert!(html.contains(&format!("{}/verify-email?token={}", TEST_APP_URL, token)));
}

/// A failed send still creates the account and keeps the token.
#[actix_rt::test]
async fn test_signup_survives_email_failure() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool, test_config()).await;

    let (status, body) = signup(&app, "Di", "di@example.com", "secret123").await;
    assert_eq!(status, 201);
    assert_eq!(body["emailSent"], false);
    assert!(stored_token(&pool, "di@example.com").await.is_some());
}

/// Unknown email gets the same 200 as a real resend, and nothing is sent.
#[actix_rt::test]
async fn test_resend_unknown_email_is_generic() {
    let resend = MockResend::start();
    let pool = create_test_pool().await;
    let mut config = test_config();
    config.email.base_url = resend.base_url.clone();
    let app = create_test_app(&pool, config).await;

    let (status, body) = post_json(
        &app,
        "/api/auth/resend-verification",
        json!({ "email": "nobody@example.com" }),
    )
    .await;

    assert_eq!(status, 200);
    assert!(body["message"].is_string());
    assert!(resend.sent().is_empty());
}

/// Resend replaces the token and emails the new one.
#[actix_rt::test]
async fn test_resend_issues_fresh_token() {
    let resend = MockResend::start();
    let pool = create_test_pool().await;
    let mut config = test_config();
    config.email.base_url = resend.base_url.clone();
    let app = create_test_app(&pool, config).await;

    signup(&app, "Eve", "eve@example.com", "secret123").await;
    let first = stored_token(&pool, "eve@example.com").await.unwrap();

    let (status, body) = post_json(
        &app,
        "/api/auth/resend-verification",
        json!({ "email": "EVE@example.com" }),
    )
    .await;
    assert_eq!(status, 200, "resend failed: {:?}", body);
    assert_eq!(body["message"], "Verification email resent successfully");

    let second = stored_token(&pool, "eve@example.com").await.unwrap();
    assert_ne!(first, second);

    let sent = resend.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent[1]["html"].as_str().unwrap().contains(&second));

    // The replaced token no longer works
    let (status, _) = get_json(&app, &format!("/api/auth/verify-email?token={}", first)).await;
    assert_eq!(status, 400);
}

#[actix_rt::test]
async fn test_resend_rejects_verified_and_blank_email() {
    let pool = create_test_pool().await;
    let app = create_test_app(&pool, test_config()).await;

    signup(&app, "Fay", "fay@example.com", "secret123").await;
    let token = stored_token(&pool, "fay@example.com").await.unwrap();
    get_json(&app, &format!("/api/auth/verify-email?token={}", token)).await;

    let (status, body) = post_json(
        &app,
        "/api/auth/resend-verification",
        json!({ "email": "fay@example.com" }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["message"], "Email is already verified. Please log in.");

    let req = test::TestRequest::post()
        .uri("/api/auth/resend-verification")
        .set_json(json!({ "email": "  " }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);
}
