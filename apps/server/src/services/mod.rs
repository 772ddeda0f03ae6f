//! Business logic services.

pub mod accounts;
pub mod email;
pub mod github_oauth;
pub mod site_generator;
pub mod verification;

use actix_web::web;

pub use email::{EmailDispatcher, ResendTransport};
pub use site_generator::{GeminiClient, SiteGenerator};

/// Configure every `/auth/*` route.
pub fn configure_auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(github_oauth::configure_routes)
        .configure(accounts::configure_routes)
        .configure(verification::configure_routes);
}
