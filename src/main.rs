use axum::http::HeaderValue;
use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod board;
mod config;
mod constants;
mod db;
mod error;
mod integrations;
mod models;
mod services;
mod utils;

use config::Config;
use constants::API_VERSION;
use db::Database;
use integrations::IgdbClient;
use services::{DraftStore, SearchCache};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gameshelf_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Starting Gameshelf Backend Server");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("API Version: {}", API_VERSION);

    // Initialize database
    let db = Database::new(&config).await?;

    // Run migrations
    tracing::info!("Running database migrations...");
    db.run_migrations().await?;

    // Initialize Redis
    let redis = redis::Client::open(config.redis_url.clone())?;
    let redis_manager = redis::aio::ConnectionManager::new(redis).await?;

    // Game catalog
    let catalog = IgdbClient::new(&config)?;

    let app_state = api::AppState {
        db,
        redis: redis_manager.clone(),
        config: config.clone(),
        catalog: Arc::new(catalog),
        drafts: DraftStore::new(redis_manager.clone(), config.draft_ttl_secs),
        search_cache: SearchCache::new(redis_manager, config.search_cache_ttl_secs),
    };

    // Build router
    let app = build_router(app_state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: api::AppState) -> Router {
    // CORS configuration
    let cors = cors_from_config(&state.config);

    Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        // Profiles
        .route(
            "/api/v1/profiles/me",
            get(api::profiles::get_my_profile).put(api::profiles::update_my_profile),
        )
        .route(
            "/api/v1/profiles/{username}",
            get(api::profiles::get_public_profile),
        )
        // Game lists
        .route(
            "/api/v1/lists",
            get(api::lists::get_my_lists).post(api::lists::create_list),
        )
        .route(
            "/api/v1/lists/{id}",
            get(api::lists::get_list)
                .put(api::lists::update_list)
                .delete(api::lists::delete_list),
        )
        .route("/api/v1/lists/{id}/items", post(api::lists::add_item))
        .route(
            "/api/v1/lists/{id}/items/{game_id}",
            delete(api::lists::remove_item),
        )
        .route(
            "/api/v1/lists/{id}/shares",
            get(api::shares::get_shares).post(api::shares::grant_share),
        )
        .route(
            "/api/v1/lists/{id}/shares/{user_id}",
            delete(api::shares::revoke_share),
        )
        .route(
            "/api/v1/lists/{id}/recommendations",
            get(api::recommendations::get_recommendations),
        )
        // Catalog
        .route("/api/v1/games/search", get(api::games::search_games))
        .route("/api/v1/games/random", get(api::games::random_game))
        .route("/api/v1/games/{id}", get(api::games::get_game))
        .route(
            "/api/v1/franchises/search",
            get(api::games::search_franchises),
        )
        .route(
            "/api/v1/franchises/random",
            get(api::games::random_franchise),
        )
        // Tier lists
        .route(
            "/api/v1/tier-lists",
            get(api::tier_lists::get_my_tier_lists),
        )
        .route(
            "/api/v1/tier-lists/{id}",
            get(api::tier_lists::get_tier_list).delete(api::tier_lists::delete_tier_list),
        )
        .route(
            "/api/v1/tier-lists/{id}/edit",
            post(api::tier_lists::edit_tier_list),
        )
        // Tier list drafts
        .route("/api/v1/tier-lists/drafts", post(api::drafts::create_draft))
        .route(
            "/api/v1/tier-lists/drafts/{draft_id}",
            get(api::drafts::get_draft).delete(api::drafts::discard_draft),
        )
        .route(
            "/api/v1/tier-lists/drafts/{draft_id}/items",
            post(api::drafts::add_draft_item),
        )
        .route(
            "/api/v1/tier-lists/drafts/{draft_id}/items/{item_key}",
            delete(api::drafts::remove_draft_item),
        )
        .route(
            "/api/v1/tier-lists/drafts/{draft_id}/moves",
            post(api::drafts::apply_move),
        )
        .route(
            "/api/v1/tier-lists/drafts/{draft_id}/rows",
            post(api::drafts::add_row),
        )
        .route(
            "/api/v1/tier-lists/drafts/{draft_id}/rows/{index}",
            patch(api::drafts::update_row).delete(api::drafts::remove_row),
        )
        .route(
            "/api/v1/tier-lists/drafts/{draft_id}/rows/{index}/move",
            post(api::drafts::move_row),
        )
        .route(
            "/api/v1/tier-lists/drafts/{draft_id}/save",
            post(api::drafts::save_draft),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_from_config(config: &Config) -> CorsLayer {
    let raw = config.cors_allowed_origins.trim();
    if raw.is_empty() || raw == "*" {
        return CorsLayer::very_permissive();
    }

    let allowed: Vec<HeaderValue> = raw
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    if allowed.is_empty() {
        tracing::warn!("No valid CORS origins parsed; falling back to permissive");
        return CorsLayer::very_permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

