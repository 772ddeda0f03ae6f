//! Artifact store: save and list generated sites.
//!
//! Responses keep the `{success, ...}` envelope the editor expects rather than
//! the generic error body.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use tracing::{error, info, warn};

use crate::db::DbPool;
use crate::models::{GeneratedSite, SaveSiteFailure, SaveSiteRequest, SaveSiteResponse};

/// Configure artifact routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/save")
            .route(web::post().to(save_site))
            .route(web::get().to(list_sites)),
    );
}

fn save_failure(mut builder: actix_web::HttpResponseBuilder, message: String) -> HttpResponse {
    builder.json(SaveSiteFailure {
        success: false,
        error: message,
    })
}

/// Save a generated site. Every call creates a new artifact.
#[utoipa::path(
    post,
    path = "/api/save",
    tag = "Sites",
    request_body = SaveSiteRequest,
    responses(
        (status = 200, description = "Saved", body = SaveSiteResponse),
        (status = 400, description = "Invalid payload", body = SaveSiteFailure),
        (status = 500, description = "Storage failure", body = SaveSiteFailure),
    )
)]
pub async fn save_site(pool: web::Data<DbPool>, body: web::Bytes) -> HttpResponse {
    let new_site = match SaveSiteRequest::from_slice(&body).and_then(SaveSiteRequest::validate) {
        Ok(site) => site,
        Err(e) => {
            warn!(error = %e, "Rejected site payload");
            return save_failure(HttpResponse::BadRequest(), e.to_string());
        }
    };

    match pool.insert_site(new_site, Utc::now()).await {
        Ok(site) => {
            info!(site_id = %site.id, site_type = %site.site_type, "Site saved");
            HttpResponse::Ok().json(SaveSiteResponse {
                success: true,
                id: site.id,
            })
        }
        Err(e) => {
            error!("Failed to save site: {}", e);
            save_failure(
                HttpResponse::InternalServerError(),
                "Failed to save site".to_string(),
            )
        }
    }
}

/// List every saved site, most recently updated first.
#[utoipa::path(
    get,
    path = "/api/save",
    tag = "Sites",
    responses(
        (status = 200, description = "All saved sites", body = Vec<GeneratedSite>),
        (status = 500, description = "Storage failure"),
    )
)]
pub async fn list_sites(pool: web::Data<DbPool>) -> HttpResponse {
    match pool.list_sites().await {
        Ok(sites) => HttpResponse::Ok().json(
            sites
                .into_iter()
                .map(GeneratedSite::from)
                .collect::<Vec<_>>(),
        ),
        Err(e) => {
            error!("Failed to list sites: {}", e);
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": "Failed to fetch sites" }))
        }
    }
}
