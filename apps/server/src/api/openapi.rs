//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::{api, auth, error, models, services};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Sketchy Server",
        version = "0.1.0",
        description = "Turns hand-drawn sketches into websites, with GitHub and email/password sign-in and a shared gallery of saved sites"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Generation
        api::generate::generate,
        // Sites
        api::sites::save_site,
        api::sites::list_sites,
        // Auth endpoints
        services::github_oauth::github_login,
        services::github_oauth::github_callback,
        services::accounts::signup,
        services::accounts::login,
        services::accounts::logout,
        services::accounts::session,
        services::verification::verify_email,
        services::verification::resend_verification,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            models::MessageResponse,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            // Sites
            models::SiteCode,
            models::GenerateRequest,
            models::SaveSiteRequest,
            models::SaveSiteResponse,
            models::SaveSiteFailure,
            models::GeneratedSite,
            // Auth
            models::SignupRequest,
            models::SignupResponse,
            models::LoginRequest,
            models::LoginResponse,
            models::UserResponse,
            models::ResendVerificationRequest,
            models::SessionUser,
            auth::SessionProvider,
            services::accounts::SessionResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Generate", description = "Sketch-to-website generation"),
        (name = "Sites", description = "Saved site gallery"),
        (name = "Auth", description = "GitHub OAuth, local accounts and email verification")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Document the session cookie set by the GitHub callback.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "github_session",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Cookie(
                        utoipa::openapi::security::ApiKeyValue::new(auth::GITHUB_TOKEN_COOKIE),
                    ),
                ),
            );
        }
    }
}
