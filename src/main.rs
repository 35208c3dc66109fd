mod api_doc;
mod auth;
mod cache;
mod comment;
mod db;
mod engagement;
mod notification;
mod routes;
mod schema_ext;

use axum::{routing::get, Router};
use dotenvy::dotenv;
use redis::Client;
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api_doc::ApiDoc;
use crate::cache::redis::RedisCache;
use crate::comment::service::CommentService;
use crate::engagement::service::EngagementService;
use crate::notification::service::NotificationService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    tracing_subscriber::fmt::init();

    // Load .env file if it exists
    dotenv().ok();

    // Create connection pool
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&std::env::var("DATABASE_URL")?)
        .await?;

    // Check if the database is initialized
    if !db::check_db_initialized(&pool).await {
        db::init_db(&pool).await?;
    }

    // Initialize Redis cache if configured
    let redis_cache = match std::env::var("REDIS_URL") {
        Ok(url) => {
            info!("Initializing Redis cache with URL: {}", url);
            match Client::open(url) {
                Ok(client) => Some(RedisCache::new(client)),
                Err(e) => {
                    error!("Failed to connect to Redis: {}", e);
                    None
                }
            }
        }
        Err(_) => {
            info!("No Redis URL configured, proceeding without cache");
            None
        }
    };

    // Create service instances
    let notification_service = Arc::new(NotificationService::new(
        pool.clone(),
        redis_cache.clone(),
    ));
    let engagement_service = Arc::new(EngagementService::new(
        pool.clone(),
        notification_service.clone(),
    ));
    let comment_service = Arc::new(CommentService::new(
        pool.clone(),
        redis_cache,
        notification_service.clone(),
    ));

    // Build the router
    let app = Router::new()
        // API documentation
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Health routes
        .merge(routes::health::routes(pool.clone()))
        // Engagement routes
        .merge(routes::social::routes(engagement_service))
        // Comment routes
        .merge(routes::comments::routes(comment_service))
        // Notification routes
        .merge(routes::notifications::routes(notification_service))
        // Welcome route
        .route("/", get(|| async { "Welcome to CodeTok Social Backend API" }))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Try different ports starting from the configured one
    let mut port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(9500);
    let max_tries = 5;
    for attempt in 1..=max_tries {
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        match axum::Server::try_bind(&addr) {
            Ok(server) => {
                info!("Server started at http://localhost:{}", port);
                info!("API documentation: http://localhost:{}/docs", port);
                return server
                    .serve(app.into_make_service())
                    .await
                    .map_err(|e| e.into());
            }
            Err(_) => {
                if attempt == max_tries {
                    return Err("Failed to bind to any port".into());
                }
                port += 1;
            }
        }
    }

    Err("Failed to bind to any port".into())
}
