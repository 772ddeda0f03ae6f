//! Mock GitHub, Gemini and Resend servers for API tests.
//!
//! Each mock is an in-process actix server on an ephemeral port. State is
//! shared through `Arc<Mutex<_>>` so tests can script answers and inspect
//! what the server under test sent.

use std::net::TcpListener;
use std::sync::{Arc, Mutex};

use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use serde_json::{Value, json};

/// Access token the mock GitHub hands out.
pub const MOCK_GITHUB_TOKEN: &str = "gho_mock_token";

/// Bind an ephemeral port and return it with its base URL.
fn bind_ephemeral() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind");
    let port = listener.local_addr().unwrap().port();
    (listener, format!("http://127.0.0.1:{}", port))
}

// ============================================================================
// GitHub
// ============================================================================

/// Scripted GitHub behaviour.
pub struct GitHubScript {
    /// Answer the token exchange with an OAuth error instead of a token.
    pub reject_code: bool,
    /// `email` field on `GET /user`.
    pub profile_email: Option<String>,
    /// Body of `GET /user/emails`.
    pub emails: Vec<Value>,
    pub login: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    /// Codes received by the token endpoint.
    pub exchanged_codes: Vec<String>,
    /// Whether `/user/emails` was requested.
    pub emails_requested: bool,
}

impl Default for GitHubScript {
    fn default() -> Self {
        Self {
            reject_code: false,
            profile_email: Some("octo@example.com".to_string()),
            emails: Vec::new(),
            login: "octocat".to_string(),
            name: Some("The Octocat".to_string()),
            avatar_url: Some("https://avatars.example.com/u/1".to_string()),
            exchanged_codes: Vec::new(),
            emails_requested: false,
        }
    }
}

pub struct MockGitHub {
    pub base_url: String,
    pub script: Arc<Mutex<GitHubScript>>,
}

fn has_mock_token(req: &HttpRequest) -> bool {
    req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", MOCK_GITHUB_TOKEN))
}

async fn github_access_token(
    script: web::Data<Arc<Mutex<GitHubScript>>>,
    body: web::Json<Value>,
) -> HttpResponse {
    let mut script = script.lock().unwrap();
    if let Some(code) = body.get("code").and_then(Value::as_str) {
        script.exchanged_codes.push(code.to_string());
    }

    if script.reject_code {
        return HttpResponse::Ok().json(json!({
            "error": "bad_verification_code",
            "error_description": "The code passed is incorrect or expired."
        }));
    }

    HttpResponse::Ok().json(json!({
        "access_token": MOCK_GITHUB_TOKEN,
        "token_type": "bearer",
        "scope": "read:user,user:email"
    }))
}

async fn github_user(
    req: HttpRequest,
    script: web::Data<Arc<Mutex<GitHubScript>>>,
) -> HttpResponse {
    if !has_mock_token(&req) {
        return HttpResponse::Unauthorized().json(json!({ "message": "Bad credentials" }));
    }
    let script = script.lock().unwrap();
    HttpResponse::Ok().json(json!({
        "id": 583231,
        "login": script.login,
        "name": script.name,
        "avatar_url": script.avatar_url,
        "email": script.profile_email,
    }))
}

async fn github_user_emails(
    req: HttpRequest,
    script: web::Data<Arc<Mutex<GitHubScript>>>,
) -> HttpResponse {
    if !has_mock_token(&req) {
        return HttpResponse::Unauthorized().json(json!({ "message": "Bad credentials" }));
    }
    let mut script = script.lock().unwrap();
    script.emails_requested = true;
    HttpResponse::Ok().json(&script.emails)
}

impl MockGitHub {
    pub fn start(script: GitHubScript) -> Self {
        let script = Arc::new(Mutex::new(script));
        let state = script.clone();
        let (listener, base_url) = bind_ephemeral();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(state.clone()))
                .route("/login/oauth/access_token", web::post().to(github_access_token))
                .route("/user", web::get().to(github_user))
                .route("/user/emails", web::get().to(github_user_emails))
        })
        .workers(1)
        .listen(listener)
        .expect("failed to listen")
        .disable_signals()
        .run();

        // Fire and forget; the server lives as long as the test runtime
        tokio::spawn(server);

        MockGitHub { base_url, script }
    }
}

// ============================================================================
// Gemini
// ============================================================================

#[derive(Default)]
pub struct GeminiScript {
    /// Text returned as the single candidate part.
    pub answer: String,
    /// Respond with this provider error message and a 400.
    pub fail_with: Option<String>,
    pub calls: usize,
    pub last_request: Option<Value>,
    pub last_api_key: Option<String>,
}

pub struct MockGemini {
    pub base_url: String,
    pub script: Arc<Mutex<GeminiScript>>,
}

async fn gemini_generate(
    req: HttpRequest,
    script: web::Data<Arc<Mutex<GeminiScript>>>,
    body: web::Json<Value>,
) -> HttpResponse {
    let mut script = script.lock().unwrap();
    script.calls += 1;
    script.last_request = Some(body.into_inner());
    script.last_api_key = req
        .headers()
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    if let Some(ref message) = script.fail_with {
        return HttpResponse::BadRequest().json(json!({
            "error": { "code": 400, "message": message, "status": "INVALID_ARGUMENT" }
        }));
    }

    HttpResponse::Ok().json(json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": script.answer }] },
            "finishReason": "STOP"
        }]
    }))
}

impl MockGemini {
    pub fn start(answer: &str) -> Self {
        let script = Arc::new(Mutex::new(GeminiScript {
            answer: answer.to_string(),
            ..Default::default()
        }));
        let state = script.clone();
        let (listener, base_url) = bind_ephemeral();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(state.clone()))
                .route("/v1beta/models/{model_action}", web::post().to(gemini_generate))
        })
        .workers(1)
        .listen(listener)
        .expect("failed to listen")
        .disable_signals()
        .run();
        tokio::spawn(server);

        MockGemini { base_url, script }
    }

    pub fn calls(&self) -> usize {
        self.script.lock().unwrap().calls
    }
}

// ============================================================================
// Resend
// ============================================================================

pub struct MockResend {
    pub base_url: String,
    pub sent: Arc<Mutex<Vec<Value>>>,
}

async fn resend_emails(
    sent: web::Data<Arc<Mutex<Vec<Value>>>>,
    body: web::Json<Value>,
) -> HttpResponse {
    let mut sent = sent.lock().unwrap();
    sent.push(body.into_inner());
    HttpResponse::Ok().json(json!({ "id": format!("email_{}", sent.len()) }))
}

impl MockResend {
    pub fn start() -> Self {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let state = sent.clone();
        let (listener, base_url) = bind_ephemeral();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(state.clone()))
                .route("/emails", web::post().to(resend_emails))
        })
        .workers(1)
        .listen(listener)
        .expect("failed to listen")
        .disable_signals()
        .run();
        tokio::spawn(server);

        MockResend { base_url, sent }
    }

    /// Every email delivered so far.
    pub fn sent(&self) -> Vec<Value> {
        self.sent.lock().unwrap().clone()
    }
}
