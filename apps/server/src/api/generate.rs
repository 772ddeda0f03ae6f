//! Sketch-to-website generation endpoint.

use actix_web::{HttpResponse, web};

use crate::error::AppResult;
use crate::models::{GenerateRequest, SiteCode};
use crate::services::site_generator::SiteGenerator;

/// Configure generation routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/generate").route(web::post().to(generate)));
}

/// Generate html/css/js from a sketch.
#[utoipa::path(
    post,
    path = "/api/generate",
    tag = "Generate",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Generated code", body = SiteCode),
        (status = 400, description = "Missing or malformed image", body = crate::error::ErrorResponse),
        (status = 500, description = "Model not configured, model failure or unparseable answer (includes `raw`)", body = crate::error::ErrorResponse),
    )
)]
pub async fn generate(
    generator: web::Data<SiteGenerator>,
    body: web::Json<GenerateRequest>,
) -> AppResult<HttpResponse> {
    let code = generator.generate(&body).await?;
    Ok(HttpResponse::Ok().json(code))
}
