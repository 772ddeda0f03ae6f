//! Shared test helpers for API tests.

use std::sync::Arc;
use std::time::Duration;

use actix_web::{App, dev::ServiceResponse, test, web};
use secrecy::SecretString;
use serde_json::Value;
use sketchy_lib::config::{
    Config, DatabaseSettings, EmailSettings, Environment, GeminiSettings, GitHubOAuthSettings,
    defaults,
};
use sketchy_lib::db::DbPool;
use sketchy_lib::services::{EmailDispatcher, GeminiClient, ResendTransport, SiteGenerator};

/// Frontend origin used in redirects and verification links.
pub const TEST_APP_URL: &str = "http://app.test";

/// Nothing listens here; outbound calls fail fast with connection refused.
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:9";

/// Fresh in-memory database with migrations applied.
pub async fn create_test_pool() -> DbPool {
    let pool = DbPool::connect("sqlite::memory:", 1, 1)
        .await
        .expect("Failed to open in-memory database");
    pool.run_migrations()
        .await
        .expect("Failed to run migrations");
    pool
}

/// Development config with every collaborator pointed at an unreachable host.
pub fn test_config() -> Config {
    Config {
        environment: Environment::Development,
        host: "127.0.0.1".to_string(),
        port: 0,
        app_url: TEST_APP_URL.to_string(),
        static_dir: None,
        database: DatabaseSettings {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        github_oauth: GitHubOAuthSettings {
            client_id: Some("test-client-id".to_string()),
            client_secret: Some(SecretString::from("test-client-secret")),
            redirect_url: None,
            oauth_base_url: UNREACHABLE_URL.to_string(),
            api_base_url: UNREACHABLE_URL.to_string(),
        },
        gemini: GeminiSettings {
            api_key: Some(SecretString::from("test-gemini-key")),
            model: defaults::GEMINI_MODEL.to_string(),
            base_url: UNREACHABLE_URL.to_string(),
            timeout: Duration::from_secs(5),
        },
        email: EmailSettings {
            api_key: Some(SecretString::from("re_test")),
            from: defaults::EMAIL_FROM.to_string(),
            base_url: UNREACHABLE_URL.to_string(),
        },
    }
}

/// Build the API exactly as `main` mounts it, without CORS or static files.
pub async fn create_test_app(
    pool: &DbPool,
    config: Config,
) -> impl actix_web::dev::Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>
{
    let dispatcher = EmailDispatcher::new(
        Arc::new(ResendTransport::new(&config.email).expect("Failed to build email transport")),
        &config.email.from,
        &config.app_url,
    );
    let generator = SiteGenerator::new(Arc::new(
        GeminiClient::new(&config.gemini).expect("Failed to build Gemini client"),
    ));

    test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(config))
            .app_data(web::Data::new(dispatcher))
            .app_data(web::Data::new(generator))
            .app_data(sketchy_lib::api::json_config())
            .app_data(sketchy_lib::api::query_config())
            .service(web::scope("/api").configure(sketchy_lib::api::configure_routes)),
    )
    .await
}

/// POST a JSON body and return status plus parsed body.
pub async fn post_json<S>(app: &S, uri: &str, body: Value) -> (u16, Value)
where
    S: actix_web::dev::Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::post().uri(uri).set_json(body).to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status().as_u16();
    let body: Value = test::read_body_json(resp).await;
    (status, body)
}

/// GET a URI and return status plus parsed body.
pub async fn get_json<S>(app: &S, uri: &str) -> (u16, Value)
where
    S: actix_web::dev::Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::get().uri(uri).to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status().as_u16();
    let body: Value = test::read_body_json(resp).await;
    (status, body)
}

/// Register a local account through the API.
pub async fn signup<S>(app: &S, name: &str, email: &str, password: &str) -> (u16, Value)
where
    S: actix_web::dev::Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    post_json(
        app,
        "/api/auth/signup",
        serde_json::json!({ "name": name, "email": email, "password": password }),
    )
    .await
}

/// Pending verification token stored for `email`.
pub async fn stored_token(pool: &DbPool, email: &str) -> Option<String> {
    sketchy_lib::db::users::find_by_email(pool.connection(), email)
        .await
        .expect("Failed to query user")
        .and_then(|u| u.verification_token)
}

/// Location header of a redirect response.
pub fn location(resp: &ServiceResponse) -> String {
    resp.headers()
        .get("Location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
