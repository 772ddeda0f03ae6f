//! API endpoint modules.

pub mod generate;
pub mod health;
pub mod openapi;
pub mod sites;

pub use generate::configure_routes as configure_generate_routes;
pub use health::configure_health_routes;
pub use openapi::ApiDoc;
pub use sites::configure_routes as configure_site_routes;

use actix_web::web;

use crate::error::AppError;

/// Configure every route mounted under `/api`.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_health_routes)
        .configure(configure_generate_routes)
        .configure(configure_site_routes)
        .configure(crate::services::configure_auth_routes);
}

/// Upper bound on JSON and raw request bodies (base64 sketches and screenshots).
pub const MAX_JSON_BODY_BYTES: usize = 20 * 1024 * 1024;

/// JSON extractor settings: body limit, and parse failures as `INVALID_INPUT` bodies.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_JSON_BODY_BYTES)
        .error_handler(|err, _req| AppError::InvalidInput(err.to_string()).into())
}

/// Query extractor settings with the same error body as [`json_config`].
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::InvalidInput(err.to_string()).into())
}
