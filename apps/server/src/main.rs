//! Sketchy server - Main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_files::{Files, NamedFile};
use actix_web::{App, HttpRequest, HttpServer, Result as ActixResult, http::header, web};
use tracing::{error, info, warn};
use tracing_subscriber::FmtSubscriber;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use sketchy_lib::api::{self, ApiDoc};
use sketchy_lib::config::Config;
use sketchy_lib::db::DbPool;
use sketchy_lib::middleware;
use sketchy_lib::services::{EmailDispatcher, GeminiClient, ResendTransport, SiteGenerator};

/// SPA fallback handler - serves index.html for client-side routing.
async fn spa_fallback(req: HttpRequest) -> ActixResult<NamedFile> {
    let static_dir = req
        .app_data::<web::Data<PathBuf>>()
        .ok_or_else(|| actix_web::error::ErrorNotFound("Static dir not configured"))?;
    Ok(NamedFile::open(static_dir.join("index.html"))?)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, DATABASE_URL, GEMINI_API_KEY and NEXT_PUBLIC_APP_URL must be set");
            error!("  - In production, values must not match development defaults");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  Sketchy Server");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }
    if !config.github_oauth.is_configured() {
        warn!("GitHub OAuth is not configured; /api/auth/github will answer 500");
    }
    if config.email.api_key.is_none() {
        warn!("RESEND_API_KEY is not set; verification emails will not be delivered");
    }

    let pool = match DbPool::new(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };
    info!("Database connection established");

    if let Err(e) = pool.run_migrations().await {
        error!("{}", e);
        std::process::exit(1);
    }

    // Outbound collaborators
    let dispatcher = match ResendTransport::new(&config.email) {
        Ok(transport) => {
            EmailDispatcher::new(Arc::new(transport), &config.email.from, &config.app_url)
        }
        Err(e) => {
            error!("Failed to initialize email transport: {}", e);
            std::process::exit(1);
        }
    };
    let generator = match GeminiClient::new(&config.gemini) {
        Ok(client) => SiteGenerator::new(Arc::new(client)),
        Err(e) => {
            error!("Failed to initialize Gemini client: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        "Vision model: {} (timeout {}s)",
        config.gemini.model,
        config.gemini.timeout.as_secs()
    );

    // Prepare shared state
    let bind_address = config.bind_address();
    let static_dir = config.static_dir.clone();
    let is_development = config.is_development();
    let app_url = config.app_url.clone();
    let config = web::Data::new(config);
    let pool = web::Data::new(pool);
    let dispatcher = web::Data::new(dispatcher);
    let generator = web::Data::new(generator);
    let openapi = ApiDoc::openapi();

    if static_dir.is_some() {
        info!("Static file serving enabled from {:?}", static_dir);
    }

    let worker_count = if is_development {
        info!(
            "Starting server at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!(
            "Starting server at http://{} ({} workers)",
            bind_address, cpus
        );
        cpus
    };

    // Start HTTP server
    let server = HttpServer::new(move || {
        let cors = if is_development {
            // Next.js dev server on either loopback name
            Cors::default()
                .allowed_origin(&app_url)
                .allowed_origin("http://127.0.0.1:3000")
        } else {
            Cors::default().allowed_origin(&app_url)
        };
        let cors = cors
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
            .supports_credentials()
            .max_age(3600);

        let mut app = App::new()
            // Add CORS middleware (must be before other middleware)
            .wrap(cors)
            .wrap(middleware::RequestLogger)
            .app_data(config.clone())
            .app_data(pool.clone())
            .app_data(dispatcher.clone())
            .app_data(generator.clone())
            // Sketches arrive inline as base64 data URLs
            .app_data(api::json_config())
            .app_data(api::query_config())
            .app_data(web::PayloadConfig::new(api::MAX_JSON_BODY_BYTES))
            .service(
                SwaggerUi::new("/api/docs/{_:.*}").url("/api/openapi.json", openapi.clone()),
            )
            .service(web::scope("/api").configure(api::configure_routes));

        // Serve the built client when SKETCHY_STATIC_DIR is set
        if let Some(ref dir) = static_dir {
            app = app
                .app_data(web::Data::new(dir.clone()))
                .service(Files::new("/_next", dir.join("_next")).prefer_utf8(true))
                .service(Files::new("/assets", dir.join("assets")).prefer_utf8(true))
                .default_service(web::route().to(spa_fallback));
        }

        app
    });

    server
        .workers(worker_count)
        .bind(&bind_address)?
        .run()
        .await
}
