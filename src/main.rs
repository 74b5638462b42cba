mod charts;
mod config;
mod engine;
mod errors;
mod handlers;
mod middleware;
mod models;
mod services;

use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_sessions::cookie::SameSite;
use tower_sessions::{MemoryStore, SessionManagerLayer};

use crate::{config::Config, services::StoreService};

#[tokio::main]
async fn main() {
    // Initialize basic tracing subscriber
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::load().expect("Failed to load configuration");
    let config_state = config.clone();

    // Initialize Redis client
    let redis_client = if config.redis.sentinel_enabled {
        Arc::new(
            redis::Client::open(
                config
                    .redis
                    .sentinel_url
                    .expect("Sentinel URL not configured"),
            )
            .expect("Failed to connect to Redis Sentinel"),
        )
    } else {
        Arc::new(redis::Client::open(config.redis.url).expect("Failed to connect to Redis"))
    };

    let store_service = StoreService::new(redis_client);

    // Session store setup
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_name("session");

    // Create router with all routes
    let app = Router::new()
        // Auth routes
        .route("/", get(handlers::serve_login_page))
        .route("/login", post(handlers::handle_login))
        .route("/register", post(handlers::handle_register))
        .route("/logout", get(handlers::handle_logout))
        // Entry routes
        .route(
            "/entry",
            get(handlers::serve_entry_page).post(handlers::submit_entry),
        )
        // Dashboard routes
        .route("/dashboard", get(handlers::serve_dashboard))
        .route("/export", get(handlers::export_csv))
        .route("/chart", get(handlers::serve_chart))
        // Admin routes
        .route("/admin", get(handlers::serve_admin_dashboard))
        .route("/admin/chart", get(handlers::serve_team_chart))
        .route("/forecast", get(handlers::forecast_json))
        // Static files
        .nest_service("/static", ServeDir::new("static"))
        // Add middleware
        .layer(from_fn(middleware::require_auth))
        .layer(session_layer)
        // Add state
        .with_state((store_service, config_state));

    let listener = tokio::net::TcpListener::bind(format!(
        "{}:{}",
        config.server.host, config.server.port
    ))
    .await
    .expect("Failed to bind server");

    tracing::info!(
        "Server running on {}:{}",
        config.server.host,
        config.server.port
    );
    axum::serve(listener, app.into_make_service())
        .await
        .expect("Failed to start server");
}
