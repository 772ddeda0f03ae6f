//! Sketch generation against a mock Gemini.

use serde_json::json;

use super::mock_providers::MockGemini;
use super::test_helpers::*;

const SKETCH: &str = "data:image/png;base64,iVBORw0KGgo=";
const SITE_JSON: &str = r#"{"html":"<main><h1>Hello</h1></main>","css":"h1{color:teal}","js":"console.log(1)"}"#;

fn config_for(gemini: &MockGemini) -> sketchy_lib::config::Config {
    let mut config = test_config();
    config.gemini.base_url = gemini.base_url.clone();
    config
}

#[actix_rt::test]
async fn test_missing_image_fails_before_model_call() {
    let gemini = MockGemini::start(SITE_JSON);
    let pool = create_test_pool().await;
    let app = create_test_app(&pool, config_for(&gemini)).await;

    let (status, body) = post_json(&app, "/api/generate", json!({ "type": "Blog" })).await;
    assert_eq!(status, 400);
    assert_eq!(body["message"], "Image is required");

    let (status, _) = post_json(&app, "/api/generate", json!({ "image": "", "type": "Blog" })).await;
    assert_eq!(status, 400);

    assert_eq!(gemini.calls(), 0);
}

#[actix_rt::test]
async fn test_generate_returns_code_and_sends_sketch() {
    let gemini = MockGemini::start(SITE_JSON);
    let pool = create_test_pool().await;
    let app = create_test_app(&pool, config_for(&gemini)).await;

    let (status, body) = post_json(
        &app,
        "/api/generate",
        json!({ "image": SKETCH, "type": "Portfolio", "prompt": "use a dark palette" }),
    )
    .await;

    assert_eq!(status, 200, "generate failed: {:?}", body);
    assert_eq!(body["html"], "<main><h1>Hello</h1></main>");
    assert_eq!(body["css"], "h1{color:teal}");
    assert_eq!(body["js"], "console.log(1)");

    let script = gemini.script.lock().unwrap();
    assert_eq!(script.calls, 1);
    assert_eq!(script.last_api_key.as_deref(), Some("test-gemini-key"));

    let request = script.last_request.as_ref().unwrap();
    let parts = &request["contents"][0]["parts"];
    let prompt = parts[0]["text"].as_str().unwrap();
    assert!(prompt.contains("The website type is: Portfolio."));
    assert!(prompt.contains("Additional instructions: use a dark palette"));
    assert_eq!(parts[1]["inline_data"]["mime_type"], "image/png");
    assert_eq!(parts[1]["inline_data"]["data"], "iVBORw0KGgo=");
}

/// A fenced answer yields the same body as an unfenced one.
#[actix_rt::test]
async fn test_fenced_answer_matches_plain_answer() {
    let plain = MockGemini::start(SITE_JSON);
    let fenced = MockGemini::start(&format!("```json\n{}\n```", SITE_JSON));
    let pool = create_test_pool().await;

    let plain_app = create_test_app(&pool, config_for(&plain)).await;
    let fenced_app = create_test_app(&pool, config_for(&fenced)).await;

    let request = json!({ "image": SKETCH, "type": "Landing Page" });
    let (plain_status, plain_body) = post_json(&plain_app, "/api/generate", request.clone()).await;
    let (fenced_status, fenced_body) = post_json(&fenced_app, "/api/generate", request).await;

    assert_eq!(plain_status, 200);
    assert_eq!(fenced_status, 200);
    assert_eq!(plain_body, fenced_body);
}

#[actix_rt::test]
async fn test_invalid_answer_returns_raw_text() {
    let answer = "Here is your website! <html>...</html>";
    let gemini = MockGemini::start(answer);
    let pool = create_test_pool().await;
    let app = create_test_app(&pool, config_for(&gemini)).await;

    let (status, body) = post_json(&app, "/api/generate", json!({ "image": SKETCH })).await;

    assert_eq!(status, 500);
    assert_eq!(body["message"], "Invalid AI response format");
    assert_eq!(body["raw"], answer);
}

#[actix_rt::test]
async fn test_array_answer_returns_raw_text() {
    let answer = r#"["<h1>x</h1>","a{}","b()"]"#;
    let gemini = MockGemini::start(answer);
    let pool = create_test_pool().await;
    let app = create_test_app(&pool, config_for(&gemini)).await;

    let (status, body) = post_json(&app, "/api/generate", json!({ "image": SKETCH })).await;

    assert_eq!(status, 500);
    assert_eq!(body["error"], "INVALID_MODEL_OUTPUT");
    assert_eq!(body["raw"], answer);
}

/// Unparseable bodies get the JSON error body, not the framework's plain text.
#[actix_rt::test]
async fn test_malformed_body_gets_json_error() {
    let gemini = MockGemini::start(SITE_JSON);
    let pool = create_test_pool().await;
    let app = create_test_app(&pool, config_for(&gemini)).await;

    for uri in ["/api/generate", "/api/auth/signup", "/api/auth/resend-verification"] {
        let req = actix_web::test::TestRequest::post()
            .uri(uri)
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = actix_web::test::call_service(&app, req).await;

        assert_eq!(resp.status().as_u16(), 400, "{}", uri);
        let content_type = resp
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("application/json"), "{}: {}", uri, content_type);
        let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
        assert_eq!(body["error"], "INVALID_INPUT", "{}", uri);
    }

    assert_eq!(gemini.calls(), 0);
}

#[actix_rt::test]
async fn test_provider_error_message_is_surfaced() {
    let gemini = MockGemini::start("");
    gemini.script.lock().unwrap().fail_with = Some("API key not valid".to_string());
    let pool = create_test_pool().await;
    let app = create_test_app(&pool, config_for(&gemini)).await;

    let (status, body) = post_json(&app, "/api/generate", json!({ "image": SKETCH })).await;

    assert_eq!(status, 500);
    assert_eq!(body["message"], "API key not valid");
}

#[actix_rt::test]
async fn test_missing_api_key_is_reported() {
    let pool = create_test_pool().await;
    let mut config = test_config();
    config.gemini.api_key = None;
    let app = create_test_app(&pool, config).await;

    let (status, body) = post_json(&app, "/api/generate", json!({ "image": SKETCH })).await;

    assert_eq!(status, 500);
    assert_eq!(body["message"], "Gemini API key not configured");
}
